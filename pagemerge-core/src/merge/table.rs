use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::*;

static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());

/// The element rows are appended to: the first `tbody`, else the first `table`.
fn row_container(html: &Html) -> Option<ElementRef<'_>> {
    html.select(&TBODY)
        .next()
        .or_else(|| html.select(&TABLE).next())
}

fn container_rows<'a>(container: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    if container.value().name() == "tbody" {
        container
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "tr")
            .collect()
    } else {
        container.select(&TR).collect()
    }
}

/// Number of cells in the first row, 0 when there is no row.
pub fn column_count(html: &str) -> usize {
    let doc = Html::parse_fragment(html);
    doc.select(&TR)
        .next()
        .map(|tr| tr.select(&CELL).count())
        .unwrap_or(0)
}

/// Number of rows in the fragment's row container.
pub fn row_count(html: &str) -> usize {
    let doc = Html::parse_fragment(html);
    row_container(&doc).map(|c| container_rows(c).len()).unwrap_or(0)
}

/// Stitches table fragments into one table.
///
/// The first fragment's container keeps its own markup (including any
/// header); the body rows of every following fragment are appended to it in
/// order. Column counts are not reconciled, a mismatch is only logged.
/// Fragments that hold no table at all are appended verbatim after the
/// merged table.
///
/// # Example
/// ```
/// use pagemerge_core::merge::table::{merge_table_html, row_count};
///
/// let merged = merge_table_html(&[
///     "<table><tr><td>1</td><td>a</td></tr></table>",
///     "<table><tr><td>2</td><td>b</td></tr></table>",
/// ]);
/// assert_eq!(row_count(&merged), 2);
/// assert_eq!(merged.matches("<table>").count(), 1);
/// ```
pub fn merge_table_html<S: AsRef<str>>(fragments: &[S]) -> String {
    let Some((first, rest)) = fragments.split_first() else {
        return String::new();
    };
    let first = first.as_ref();

    let base = Html::parse_fragment(first);
    let Some(container) = row_container(&base) else {
        warn!("First table fragment holds no table, leaving fragments unmerged");
        return fragments
            .iter()
            .map(|f| f.as_ref().trim())
            .collect::<Vec<_>>()
            .join("\n");
    };

    let columns = column_count(first);
    let mut appended_rows = String::new();
    let mut stray = Vec::new();

    for (i, fragment) in rest.iter().enumerate() {
        let fragment = fragment.as_ref();
        let doc = Html::parse_fragment(fragment);
        match row_container(&doc) {
            Some(tb) => {
                let fragment_columns = column_count(fragment);
                if fragment_columns != columns {
                    warn!(
                        "Table fragment {} has {} columns, first fragment has {}",
                        i + 1,
                        fragment_columns,
                        columns
                    );
                }
                for tr in container_rows(tb) {
                    appended_rows.push_str(&tr.html());
                }
            }
            None => stray.push(fragment.trim()),
        }
    }

    let serialized = base.root_element().inner_html();
    let container_html = container.html();
    let close = format!("</{}>", container.value().name());

    let mut merged = match (
        serialized.find(&container_html),
        container_html.rfind(&close),
    ) {
        (Some(start), Some(close_at)) => {
            let insert_at = start + close_at;
            let mut merged = String::with_capacity(serialized.len() + appended_rows.len());
            merged.push_str(&serialized[..insert_at]);
            merged.push_str(&appended_rows);
            merged.push_str(&serialized[insert_at..]);
            merged
        }
        _ => {
            warn!("Could not locate table body in serialized fragment");
            serialized
        }
    };

    for text in stray {
        merged.push('\n');
        merged.push_str(text);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> String {
        let body: String = rows
            .iter()
            .map(|cells| {
                let cells: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
                format!("<tr>{cells}</tr>")
            })
            .collect();
        format!("<table>{body}</table>")
    }

    #[test]
    fn test_column_and_row_count() {
        let html = table(&[&["a", "b", "c"], &["d", "e", "f"]]);
        assert_eq!(column_count(&html), 3);
        assert_eq!(row_count(&html), 2);
        assert_eq!(column_count("no table here"), 0);
        assert_eq!(row_count("no table here"), 0);
    }

    #[test]
    fn test_merge_appends_rows_in_order() {
        let merged = merge_table_html(&[
            table(&[&["1", "a"], &["2", "b"]]),
            table(&[&["3", "c"]]),
            table(&[&["4", "d"], &["5", "e"]]),
        ]);
        assert_eq!(row_count(&merged), 5);
        assert_eq!(merged.matches("<table>").count(), 1);

        let order: Vec<usize> = ["1", "2", "3", "4", "5"]
            .iter()
            .map(|n| merged.find(&format!("<td>{n}</td>")).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_merge_keeps_first_header_and_skips_repeated_headers() {
        let first = "<table><thead><tr><th>Name</th><th>Qty</th></tr></thead>\
                     <tbody><tr><td>bolt</td><td>4</td></tr></tbody></table>";
        let second = "<table><thead><tr><th>Name</th><th>Qty</th></tr></thead>\
                      <tbody><tr><td>nut</td><td>8</td></tr></tbody></table>";
        let merged = merge_table_html(&[first, second]);
        assert_eq!(merged.matches("<th>Name</th>").count(), 1);
        assert_eq!(row_count(&merged), 2);
        assert!(merged.find("bolt").unwrap() < merged.find("nut").unwrap());
    }

    #[test]
    fn test_merge_column_mismatch_is_not_repaired() {
        let merged = merge_table_html(&[
            table(&[&["a", "b", "c"]]),
            table(&[&["d", "e"]]),
        ]);
        assert_eq!(row_count(&merged), 2);
        assert!(merged.contains("<tr><td>d</td><td>e</td></tr>"));
    }

    #[test]
    fn test_merge_single_and_empty() {
        assert_eq!(merge_table_html::<&str>(&[]), "");
        let only = table(&[&["x"]]);
        assert_eq!(row_count(&merge_table_html(&[only])), 1);
    }

    #[test]
    fn test_merge_keeps_stray_text() {
        let merged = merge_table_html(&[table(&[&["x"]]), "continued on next page".to_string()]);
        assert_eq!(row_count(&merged), 1);
        assert!(merged.ends_with("\ncontinued on next page"));
    }
}
