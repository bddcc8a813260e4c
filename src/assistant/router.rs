//! Query classification node.

use async_trait::async_trait;

use crate::node::{Node, NodeContext, NodeError, NodePartial};
use crate::state::StateSnapshot;
use crate::types::ChannelType;

use super::{STEP_ASSISTANCE, STEP_FETCH_PRODUCT_DATA, STEP_FETCH_USER_DATA, STEP_PROCESS};

/// Keywords that send a query to the user-data lookup.
const USER_KEYWORDS: &[&str] = &["account", "balance", "profile", "my orders"];
/// Keywords that send a query to the product-data lookup.
const PRODUCT_KEYWORDS: &[&str] = &["inventory", "product", "stock", "price"];
/// Keywords that short-circuit to the canned assistance response.
const ASSISTANCE_KEYWORDS: &[&str] = &["assist", "help", "support"];

/// Classifies the query with ordered, case-insensitive keyword tests and
/// writes the step marker its conditional edge routes on.
///
/// First match wins, checked in the order user, product, assistance; a query
/// matching nothing goes straight to processing.
#[derive(Debug, Clone, Default)]
pub struct RouterNode;

fn matches_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

#[async_trait]
impl Node for RouterNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePartial, NodeError> {
        let text = snapshot.query.to_lowercase();

        let step = if matches_any(&text, USER_KEYWORDS) {
            STEP_FETCH_USER_DATA
        } else if matches_any(&text, PRODUCT_KEYWORDS) {
            STEP_FETCH_PRODUCT_DATA
        } else if matches_any(&text, ASSISTANCE_KEYWORDS) {
            STEP_ASSISTANCE
        } else {
            STEP_PROCESS
        };

        Ok(NodePartial::new()
            .with_step(step)
            .with_thoughts(vec![ctx.trace(format!("routed query to '{step}'"))]))
    }

    fn writes(&self) -> &'static [ChannelType] {
        &[ChannelType::Step, ChannelType::Thought]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn route(query: &str) -> String {
        let snapshot = crate::state::VersionedState::new_with_query(query).snapshot();
        let ctx = NodeContext {
            node_id: "router".to_string(),
            step: 1,
        };
        RouterNode
            .run(snapshot, ctx)
            .await
            .unwrap()
            .step
            .expect("router always writes a step")
    }

    #[tokio::test]
    async fn keyword_tests_are_ordered_and_case_insensitive() {
        assert_eq!(route("What is my ACCOUNT balance?").await, "fetch_user_data");
        assert_eq!(route("current inventory for widgets").await, "fetch_product_data");
        assert_eq!(route("please assist me").await, "assistance");
        assert_eq!(route("tell me a joke").await, "process");
        // "account" wins over "help" because user keywords are checked first.
        assert_eq!(route("help with my account").await, "fetch_user_data");
    }
}
