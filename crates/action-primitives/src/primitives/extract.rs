//! Extract primitive - Turn a listing into content items

use crate::primitives::InteractionEngine;
use action_locator::{ChainOutcome, FallbackChain, LinkStrategy, SelectorStrategy};
use cdp_adapter::QueryScope;
use sockpuppet_core_types::ContentItem;
use tracing::debug;

/// Execute entity list extraction
///
/// The first scope strategy with at least one match supplies the containers.
/// Each container is resolved through the link strategies in order;
/// containers without a resolvable link are skipped. Never fails: exhaustion
/// yields an empty list.
pub async fn execute_extract(
    engine: &InteractionEngine,
    scopes: &[SelectorStrategy],
    links: &[LinkStrategy],
    limit: Option<usize>,
) -> Vec<ContentItem> {
    if limit == Some(0) {
        return Vec::new();
    }

    let scope_chain = FallbackChain::of(scopes.iter().cloned());
    let containers = match scope_chain.run(engine.page(), &QueryScope::Document).await {
        ChainOutcome::Resolved {
            strategy, output, ..
        } => {
            debug!(scope = %strategy, containers = output.len(), "listing scope resolved");
            output
        }
        ChainOutcome::Exhausted { failures } => {
            debug!(failures = failures.len(), "no listing scope matched");
            return Vec::new();
        }
    };

    let link_chain = FallbackChain::of(links.iter().cloned());
    let mut items = Vec::new();
    for container in containers {
        let Some(link) = link_chain.run(engine.page(), &container).await.output() else {
            continue;
        };
        items.push(ContentItem::from_element(link.id, link.url, link.element));
        if limit.is_some_and(|max| items.len() >= max) {
            break;
        }
    }

    debug!(items = items.len(), "listing extracted");
    items
}

#[cfg(test)]
mod tests {
    use crate::testing::{engine_on, HOME};
    use action_locator::{LinkStrategy, SelectorStrategy};
    use cdp_adapter::fake::{FakeNode, FakePage};
    use sockpuppet_core_types::ids_of;

    fn renderer(id: &str) -> FakeNode {
        FakeNode::new("ytd-rich-item-renderer").child(FakeNode::watch_link(id))
    }

    fn scopes() -> Vec<SelectorStrategy> {
        SelectorStrategy::css_list(&["ytd-rich-item-renderer", "#dismissible"])
    }

    fn links() -> Vec<LinkStrategy> {
        LinkStrategy::list(&["a#video-title-link", "a[href*=\"/watch?v=\"]"])
    }

    #[tokio::test]
    async fn extracts_in_page_order_and_respects_limit() {
        let page = FakePage::new().route(
            HOME,
            vec![renderer("a"), renderer("b"), renderer("c"), renderer("d")],
        );
        let (engine, _page) = engine_on(page).await;
        let items = engine.extract_entity_list(&scopes(), &links(), Some(3)).await;
        assert_eq!(ids_of(&items), ["a", "b", "c"]);
        assert!(items.iter().all(|item| item.element_in(engine.generation()).is_some()));
    }

    #[tokio::test]
    async fn falls_back_to_later_scope_and_skips_linkless_containers() {
        let page = FakePage::new().route(
            HOME,
            vec![
                FakeNode::new("#dismissible").child(FakeNode::new("a").attr("href", "/@chan")),
                FakeNode::new("#dismissible").child(FakeNode::watch_link("x")),
            ],
        );
        let (engine, _page) = engine_on(page).await;
        let items = engine.extract_entity_list(&scopes(), &links(), None).await;
        assert_eq!(ids_of(&items), ["x"]);
    }

    #[tokio::test]
    async fn repeated_extraction_is_stable() {
        let page = FakePage::new().route(HOME, vec![renderer("a"), renderer("b")]);
        let (engine, _page) = engine_on(page).await;
        let first = engine.extract_entity_list(&scopes(), &links(), None).await;
        let second = engine.extract_entity_list(&scopes(), &links(), None).await;
        assert_eq!(ids_of(&first), ids_of(&second));
    }

    #[tokio::test]
    async fn exhausted_strategies_give_an_empty_list() {
        let (engine, _page) = engine_on(FakePage::new()).await;
        assert!(engine
            .extract_entity_list(&scopes(), &links(), Some(10))
            .await
            .is_empty());
    }
}
