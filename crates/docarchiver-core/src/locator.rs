//! Review control discovery.
//!
//! The review submission control has no stable identity across deployments
//! of the document system: its `name` differs between units and some builds
//! render it as a plain element with an inline handler. [`ElementLocator`]
//! tries an ordered list of [`LocateStrategy`]s and reports which one matched.

use async_trait::async_trait;
use docarchiver_config::PagesConfig;
use tracing::debug;

use crate::dom::{ElementSnapshot, FrameDocument, ReadyState, attr_selector};
use crate::error::DomError;

/// What the locator is looking for.
#[derive(Debug, Clone)]
pub struct ControlTarget {
    /// Visible label or value of the control.
    pub label: String,
    /// Known `name` attributes, most preferred first.
    pub known_names: Vec<String>,
}

impl ControlTarget {
    pub fn review_control(pages: &PagesConfig) -> Self {
        Self {
            label: pages.review_label.clone(),
            known_names: pages.review_control_names.clone(),
        }
    }
}

/// A located control and the strategy that found it.
#[derive(Debug, Clone)]
pub struct FoundControl {
    pub element: ElementSnapshot,
    pub strategy: &'static str,
}

/// One way of finding the target control.
#[async_trait]
pub trait LocateStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_locate(
        &self,
        doc: &dyn FrameDocument,
        target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError>;
}

/// Known `name` identifiers, checked in list order.
pub struct KnownNames;

#[async_trait]
impl LocateStrategy for KnownNames {
    fn name(&self) -> &'static str {
        "known-name"
    }

    async fn try_locate(
        &self,
        doc: &dyn FrameDocument,
        target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError> {
        for name in &target.known_names {
            let selector = format!(
                "input{}{}",
                attr_selector("name", name),
                attr_selector("value", &target.label)
            );
            if let Some(found) = doc.query(&selector).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

/// Exact match on the `value` attribute.
pub struct ValueAttribute;

#[async_trait]
impl LocateStrategy for ValueAttribute {
    fn name(&self) -> &'static str {
        "value-attribute"
    }

    async fn try_locate(
        &self,
        doc: &dyn FrameDocument,
        target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError> {
        doc.query(&format!("input{}", attr_selector("value", &target.label)))
            .await
    }
}

/// Button-like inputs whose current value equals the label.
pub struct ButtonInputs;

#[async_trait]
impl LocateStrategy for ButtonInputs {
    fn name(&self) -> &'static str {
        "button-input"
    }

    async fn try_locate(
        &self,
        doc: &dyn FrameDocument,
        target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError> {
        let inputs = doc
            .query_all(r#"input[type="button"], input[type="submit"]"#)
            .await?;
        Ok(inputs.into_iter().find(|el| el.value == target.label))
    }
}

/// Any button, input or clickable element whose text contains the label.
pub struct ClickableText;

#[async_trait]
impl LocateStrategy for ClickableText {
    fn name(&self) -> &'static str {
        "clickable-text"
    }

    async fn try_locate(
        &self,
        doc: &dyn FrameDocument,
        target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError> {
        let elements = doc.query_all("*").await?;
        Ok(elements.into_iter().find(|el| {
            el.text.contains(target.label.as_str())
                && (el.is_tag("button") || el.is_tag("input") || el.is_clickable())
        }))
    }
}

/// Elements with an inline `onclick` attribute, matched on value or text.
pub struct InlineHandler;

#[async_trait]
impl LocateStrategy for InlineHandler {
    fn name(&self) -> &'static str {
        "inline-handler"
    }

    async fn try_locate(
        &self,
        doc: &dyn FrameDocument,
        target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError> {
        let elements = doc.query_all("[onclick]").await?;
        Ok(elements.into_iter().find(|el| {
            el.value == target.label || el.text.contains(target.label.as_str())
        }))
    }
}

/// Finds a control by trying strategies in order; the first match wins.
///
/// `locate` only reads the document and can be called any number of times.
pub struct ElementLocator {
    target: ControlTarget,
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl ElementLocator {
    /// Locator with the default strategy order.
    pub fn new(target: ControlTarget) -> Self {
        Self::with_strategies(
            target,
            vec![
                Box::new(KnownNames),
                Box::new(ValueAttribute),
                Box::new(ButtonInputs),
                Box::new(ClickableText),
                Box::new(InlineHandler),
            ],
        )
    }

    pub fn with_strategies(target: ControlTarget, strategies: Vec<Box<dyn LocateStrategy>>) -> Self {
        Self { target, strategies }
    }

    pub fn target(&self) -> &ControlTarget {
        &self.target
    }

    /// Names of the strategies in the order they are tried.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Locate the control. `None` while the document is still loading or
    /// when no strategy matches.
    pub async fn locate(&self, doc: &dyn FrameDocument) -> Result<Option<FoundControl>, DomError> {
        if doc.ready_state().await? != ReadyState::Complete {
            debug!("Frame document not complete, skipping lookup");
            return Ok(None);
        }

        for strategy in &self.strategies {
            if let Some(element) = strategy.try_locate(doc, &self.target).await? {
                debug!(
                    strategy = strategy.name(),
                    name = element.name().unwrap_or(""),
                    "Found '{}' control",
                    self.target.label
                );
                return Ok(Some(FoundControl {
                    element,
                    strategy: strategy.name(),
                }));
            }
        }

        debug!("No strategy found the '{}' control", self.target.label);
        Ok(None)
    }
}

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;
