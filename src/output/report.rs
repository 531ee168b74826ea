//! Link listings printed after a round

use crate::crawler::Link;

/// Formats a link as `url<TAB>text`
///
/// Line breaks inside the anchor text are flattened so each link stays on
/// one line.
pub fn format_link_line(link: &Link) -> String {
    let text: String = link
        .text()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}\t{}", link.url(), text)
}

/// Prints one line per link to stdout
pub fn print_links(links: &[Link]) {
    for link in links {
        println!("{}", format_link_line(link));
    }
    println!("({} links)", links.len());
}
