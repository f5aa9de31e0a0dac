//! Merges hop outputs into the final response

use super::{Chain, ExecutionMode};
use crate::domain::ProviderCatalog;

/// User-facing message returned when no hop produced a response
pub const FALLBACK_APOLOGY: &str =
    "I'm sorry, I wasn't able to put together a response this time. Please try again shortly.";

/// Produce the final response for a chain
///
/// Sequential chains return the last successful hop verbatim: the last-hop
/// template already asked that backend to merge earlier context. Parallel
/// chains concatenate every successful hop under its provider's display name,
/// in pattern-index order.
pub fn synthesize(chain: &Chain, mode: ExecutionMode, catalog: &ProviderCatalog) -> String {
    let successful: Vec<(&str, &str)> = chain
        .successful_hops()
        .filter_map(|h| {
            h.response_content
                .as_deref()
                .map(|content| (h.provider_id.as_str(), content))
        })
        .collect();

    match successful.as_slice() {
        [] => FALLBACK_APOLOGY.to_string(),
        [(_, content)] => (*content).to_string(),
        _ => match mode {
            ExecutionMode::Sequential => successful
                .last()
                .map(|(_, content)| (*content).to_string())
                .unwrap_or_else(|| FALLBACK_APOLOGY.to_string()),
            ExecutionMode::Parallel => successful
                .iter()
                .map(|&(provider_id, content)| {
                    let label = catalog
                        .lookup(provider_id)
                        .map(|p| p.display_name())
                        .unwrap_or(provider_id);
                    format!("## {}\n\n{}", label, content)
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::HopRecord;
    use crate::domain::{BackendKind, HopError, HopOutput, Provider};

    fn catalog() -> ProviderCatalog {
        ProviderCatalog::new(vec![
            Provider::new("local", "Local Llama", BackendKind::Local),
            Provider::new("gpt", "GPT-4o", BackendKind::OpenAi),
            Provider::new("claude", "Claude Sonnet", BackendKind::Anthropic),
        ])
        .unwrap()
    }

    fn chain_with(hops: Vec<HopRecord>) -> Chain {
        let mut chain = Chain::new("test", "question");
        chain.start().unwrap();
        for hop in hops {
            chain.record_hop(hop).unwrap();
        }
        chain.sort_hops();
        chain
    }

    fn ok(index: usize, provider: &str, content: &str) -> HopRecord {
        HopRecord::success(index, provider, "p", HopOutput::new(content, 1, 0.0), 1)
    }

    fn failed(index: usize, provider: &str) -> HopRecord {
        HopRecord::failure(index, provider, "p", &HopError::upstream(provider, "boom"), 1)
    }

    #[test]
    fn test_no_successful_hops_returns_apology() {
        let chain = chain_with(vec![failed(0, "local"), failed(1, "gpt")]);

        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            assert_eq!(synthesize(&chain, mode, &catalog()), FALLBACK_APOLOGY);
        }
    }

    #[test]
    fn test_single_successful_hop_is_verbatim() {
        let chain = chain_with(vec![failed(0, "local"), ok(1, "gpt", "  exact text\n")]);

        for mode in [ExecutionMode::Sequential, ExecutionMode::Parallel] {
            assert_eq!(synthesize(&chain, mode, &catalog()), "  exact text\n");
        }
    }

    #[test]
    fn test_sequential_returns_last_successful() {
        let chain = chain_with(vec![
            ok(0, "local", "draft"),
            ok(1, "gpt", "refined"),
            failed(2, "claude"),
        ]);

        assert_eq!(
            synthesize(&chain, ExecutionMode::Sequential, &catalog()),
            "refined"
        );
    }

    #[test]
    fn test_parallel_concatenates_labelled_sections_in_index_order() {
        let chain = chain_with(vec![
            ok(2, "claude", "third"),
            ok(0, "local", "first"),
            failed(1, "gpt"),
        ]);

        assert_eq!(
            synthesize(&chain, ExecutionMode::Parallel, &catalog()),
            "## Local Llama\n\nfirst\n\n## Claude Sonnet\n\nthird"
        );
    }
}
