//! Terminal output for the `agw` subcommands.
//!
//! Each `run_*` function prints to stdout; diagnostics go through
//! `tracing` to stderr.

use anyhow::{bail, Result};

use assistant_gateway_core::text::trim_words;

use crate::assistant::{Assistant, SendOptions};

/// Words of body text shown per search hit.
const EXCERPT_WORDS: usize = 30;

pub fn run_providers(assistant: &Assistant) {
    let active = assistant.active_provider();

    println!(
        "{:<12} {:<12} {:<16} DEFAULT MODEL",
        "PROVIDER", "NAME", "STATUS"
    );
    for info in assistant.list_providers() {
        let status = if info.configured {
            "configured"
        } else {
            "not configured"
        };
        println!(
            "{:<12} {:<12} {:<16} {}",
            info.id, info.name, status, info.default_model
        );
    }
    println!();
    println!(
        "active: {} (preferred: {})",
        active.id(),
        assistant.gateway().preferred()
    );
}

pub fn run_index(assistant: &Assistant) {
    let stats = assistant.index_stats();
    println!("Indexed {} items.", stats.items);
    if !stats.content_types.is_empty() {
        let types: Vec<&str> = stats.content_types.iter().map(String::as_str).collect();
        println!("types: {}", types.join(", "));
    }
}

pub fn run_search(assistant: &Assistant, query: &str, limit: Option<usize>) {
    let results = match limit {
        Some(limit) => assistant.search(query, limit),
        None => assistant.search_default(query),
    };

    if results.is_empty() {
        println!("No results.");
        return;
    }

    for (i, result) in results.iter().enumerate() {
        let item = &result.item;
        println!(
            "{}. [{}] {} / {}",
            i + 1,
            result.relevance_score,
            item.content_type,
            item.title
        );
        if !item.url.is_empty() {
            println!("    url: {}", item.url);
        }
        println!("    excerpt: \"{}\"", trim_words(&item.body, EXCERPT_WORDS));
        println!("    id: {}", item.id);
        println!();
    }
}

pub fn run_context(assistant: &Assistant, query: &str) {
    let context = assistant.get_context(query);
    if context.is_empty() {
        println!("No relevant content.");
    } else {
        print!("{}", context);
    }
}

pub fn run_augment(assistant: &Assistant, message: &str) {
    println!("{}", assistant.augment_message(message));
}

pub fn run_send(assistant: &Assistant, message: &str, options: &SendOptions) -> Result<()> {
    match assistant.send_message(message, options) {
        Ok(response) => {
            println!("{}", response.message);
            if !response.usage.is_empty() {
                let usage: Vec<String> = response
                    .usage
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect();
                eprintln!("model: {} ({})", response.model, usage.join(", "));
            } else {
                eprintln!("model: {}", response.model);
            }
            Ok(())
        }
        Err(e) => bail!("{} [{}]", e, e.kind().code()),
    }
}
