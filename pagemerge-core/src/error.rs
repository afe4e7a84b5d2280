use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum MergeError {
    #[snafu(display("Invalid removal pattern `{}`: {}", pattern, source))]
    Pattern {
        source: regex::Error,
        pattern: String,
    },
    #[snafu(display("Invalid merge config `{}`: {}", field, message))]
    Config { field: String, message: String },
    #[snafu(display("Detector failed on page {}: {}", page_number, message))]
    Detect { page_number: u32, message: String },
    #[snafu(display("Renderer failed on page {}: {}", page_number, message))]
    Render { page_number: u32, message: String },
    #[snafu(display("Upload `{}` error: {}", object_name, message))]
    Upload {
        object_name: String,
        message: String,
    },
    #[snafu(display("Image encode for `{}` error: {}", object_name, source))]
    ImageEncode {
        source: image::ImageError,
        object_name: String,
    },
    #[snafu(display("Json decode at stage `{}` error: {}", stage, source))]
    Json {
        source: serde_json::Error,
        stage: String,
    },
    #[snafu(display("Io on `{}` error: {}", path, source))]
    Io {
        source: std::io::Error,
        path: String,
    },
}
