use tracing::*;

use crate::{
    layout::{component::Component, page::PageUnit},
    merge::table::merge_table_html,
};

/// One table that ran across consecutive pages, stitched back together.
#[derive(Debug, Clone, PartialEq)]
pub struct TableChainBlock {
    /// Pages that contributed a fragment, in order. Always two or more.
    pub member_pages: Vec<u32>,
    /// Merged table markup.
    pub merged_table_text: String,
    /// Non-table detections that were clustered into the table fragments,
    /// one unit per contributing page that had any.
    pub extras: Vec<PageUnit>,
}

/// Content region after table chains have been fused.
#[derive(Debug, Clone, PartialEq)]
pub enum MergedUnit {
    Page(PageUnit),
    Chain(TableChainBlock),
}

/// Fragments gathered while a chain is open.
#[derive(Debug)]
struct OpenChain {
    member_pages: Vec<u32>,
    fragments: Vec<Component>,
}

impl OpenChain {
    fn start(page_number: u32, fragment: Component) -> Self {
        Self {
            member_pages: vec![page_number],
            fragments: vec![fragment],
        }
    }

    fn push(&mut self, page_number: u32, fragment: Component) {
        self.member_pages.push(page_number);
        self.fragments.push(fragment);
    }

    fn finish(self) -> TableChainBlock {
        let markup: Vec<String> = self.fragments.iter().map(Component::table_markup).collect();
        let extras = self
            .member_pages
            .iter()
            .zip(&self.fragments)
            .filter_map(|(&page_number, fragment)| {
                let rest: Vec<_> = fragment.non_table_detections().cloned().collect();
                (!rest.is_empty()).then(|| PageUnit::new(page_number, vec![Component::new(rest)]))
            })
            .collect();

        info!("Merged table across pages {:?}", self.member_pages);
        TableChainBlock {
            member_pages: self.member_pages,
            merged_table_text: merge_table_html(&markup),
            extras,
        }
    }
}

#[derive(Debug)]
enum ChainState {
    Scanning,
    InChain(OpenChain),
}

/// Fuses tables that continue across page breaks.
///
/// A chain opens on a page whose last component is a table when the next
/// page opens with a table. It keeps absorbing the leading table of each
/// following page for as long as that table is the whole page and the page
/// after it also opens with a table. Whatever a page holds after its leading
/// table closes the chain and is scanned again as a page of its own, so it
/// may open the next chain.
///
/// This is stricter than extending on every page that merely opens with a
/// table: a page with content after its leading table never stays inside
/// the chain, so that content keeps its place between the tables instead of
/// being dropped or moved past the merged table.
pub fn merge_table_chains(mut pages: Vec<PageUnit>) -> Vec<MergedUnit> {
    let mut merged = Vec::with_capacity(pages.len());
    let mut state = ChainState::Scanning;
    let mut i = 0;

    while i < pages.len() {
        let next_opens_with_table = pages.get(i + 1).is_some_and(PageUnit::first_is_table);

        state = match state {
            ChainState::Scanning => {
                let opens_chain = pages[i].last_is_table() && next_opens_with_table;
                let page_number = pages[i].page_number;
                let mut components = std::mem::take(&mut pages[i].components);
                i += 1;
                match components.pop() {
                    Some(table) if opens_chain => {
                        if !components.is_empty() {
                            merged.push(MergedUnit::Page(PageUnit::new(page_number, components)));
                        }
                        ChainState::InChain(OpenChain::start(page_number, table))
                    }
                    last => {
                        components.extend(last);
                        merged.push(MergedUnit::Page(PageUnit::new(page_number, components)));
                        ChainState::Scanning
                    }
                }
            }
            ChainState::InChain(mut chain) => {
                let page_number = pages[i].page_number;
                let mut rest = std::mem::take(&mut pages[i].components).into_iter();
                match rest.next() {
                    Some(table) if table.is_table() => {
                        chain.push(page_number, table);
                        let residual: Vec<Component> = rest.collect();
                        if residual.is_empty() && next_opens_with_table {
                            i += 1;
                            ChainState::InChain(chain)
                        } else {
                            merged.push(MergedUnit::Chain(chain.finish()));
                            if residual.is_empty() {
                                i += 1;
                            } else {
                                pages[i].components = residual;
                            }
                            ChainState::Scanning
                        }
                    }
                    leading => {
                        // chains only advance onto pages opening with a table
                        pages[i].components = leading.into_iter().chain(rest).collect();
                        merged.push(MergedUnit::Chain(chain.finish()));
                        ChainState::Scanning
                    }
                }
            }
        };
    }

    if let ChainState::InChain(chain) = state {
        merged.push(MergedUnit::Chain(chain.finish()));
    }

    merged
}
