//! Plain-text rendering of a stored article for the `show` command

use crate::storage::{Article, LinkedArticle};
use std::fmt::Write;

/// Renders an article with its summary and graph neighbours
pub fn format_article(article: &Article) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", article.title);
    let _ = writeln!(out, "  URL: {}", article.url);
    if let Some(created_at) = &article.created_at {
        let _ = writeln!(out, "  Stored: {}", created_at);
    }
    let _ = writeln!(out, "  Body: {} characters", article.body.chars().count());
    out.push('\n');

    match &article.summary {
        Some(summary) => {
            let _ = writeln!(out, "Summary ({}):", summary.created_at);
            let _ = writeln!(out, "  {}", summary.content);
        }
        None => out.push_str("Summary: none\n"),
    }
    out.push('\n');

    write_neighbours(&mut out, "Parents", &article.parents);
    write_neighbours(&mut out, "Children", &article.children);

    out
}

/// Prints an article to stdout
pub fn print_article(article: &Article) {
    print!("{}", format_article(article));
}

fn write_neighbours(out: &mut String, label: &str, neighbours: &[LinkedArticle]) {
    let _ = writeln!(out, "{} ({}):", label, neighbours.len());
    for neighbour in neighbours {
        let _ = writeln!(out, "  - {} <{}>", neighbour.title, neighbour.url);
    }
}
