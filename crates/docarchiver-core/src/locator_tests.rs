use super::*;
use crate::memory::{Element, MemoryDocument};

fn locator() -> ElementLocator {
    ElementLocator::new(ControlTarget::review_control(&PagesConfig::default()))
}

#[test]
fn test_default_strategy_order() {
    assert_eq!(
        locator().strategy_names(),
        vec![
            "known-name",
            "value-attribute",
            "button-input",
            "clickable-text",
            "inline-handler"
        ]
    );
}

#[tokio::test]
async fn test_known_name_prefers_list_order() {
    let doc = MemoryDocument::new("about:blank");
    let later = doc.append(
        None,
        Element::new("input").attr("name", "000011603").attr("value", "存查"),
    );
    let preferred = doc.append(
        None,
        Element::new("input").attr("name", "000011803").attr("value", "存查"),
    );

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "known-name");
    assert_eq!(found.element.node, preferred);
    assert_ne!(found.element.node, later);
}

#[tokio::test]
async fn test_value_attribute_with_unknown_name() {
    let doc = MemoryDocument::new("about:blank");
    let button = doc.append(
        None,
        Element::new("input").attr("name", "000099999").attr("value", "存查"),
    );

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "value-attribute");
    assert_eq!(found.element.node, button);
}

#[tokio::test]
async fn test_button_input_matches_value_property() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(
        None,
        Element::new("input").attr("type", "button").attr("value", "存檔"),
    );
    let button = doc.append(
        None,
        Element::new("input")
            .attr("type", "button")
            .attr("value", "送出")
            .value("存查"),
    );

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "button-input");
    assert_eq!(found.element.node, button);
    assert_eq!(found.element.attr("value"), Some("送出"));
}

#[tokio::test]
async fn test_button_input_ignores_text_inputs() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("input").attr("type", "text").value("存查"));
    let submit = doc.append(None, Element::new("input").attr("type", "submit").value("存查"));

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "button-input");
    assert_eq!(found.element.node, submit);
}

#[tokio::test]
async fn test_inline_handler_matches_value() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("td").attr("onclick", "openHelp()").text("說明"));
    let control = doc.append(
        None,
        Element::new("button")
            .attr("onclick", "doReview()")
            .text("送出")
            .value("存查"),
    );

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "inline-handler");
    assert_eq!(found.element.node, control);
}

#[tokio::test]
async fn test_clickable_text_button() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("span").text("存查說明"));
    let button = doc.append(None, Element::new("button").text("存查"));

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "clickable-text");
    assert_eq!(found.element.node, button);
}

#[tokio::test]
async fn test_clickable_text_property_handler() {
    let doc = MemoryDocument::new("about:blank");
    let link = doc.append(None, Element::new("a").text("存查").click_handler());

    let found = locator().locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "clickable-text");
    assert_eq!(found.element.node, link);
}

#[tokio::test]
async fn test_no_match() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("div").text("存查"));
    doc.append(None, Element::new("input").attr("value", "存檔"));

    assert!(locator().locate(&doc).await.unwrap().is_none());
}

#[tokio::test]
async fn test_loading_document_returns_none() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("input").attr("value", "存查"));
    doc.set_ready_state(ReadyState::Interactive);

    assert!(locator().locate(&doc).await.unwrap().is_none());
}

#[tokio::test]
async fn test_locate_is_repeatable() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("input").attr("value", "存查"));

    let loc = locator();
    let first = loc.locate(&doc).await.unwrap().unwrap();
    let second = loc.locate(&doc).await.unwrap().unwrap();
    assert_eq!(first.element, second.element);
    assert!(doc.actions().is_empty());
}

#[tokio::test]
async fn test_frame_error_propagates() {
    let doc = MemoryDocument::new("about:blank");
    doc.set_unavailable(Some(DomError::FrameAbsent("dTreeContent".to_string())));
    assert!(locator().locate(&doc).await.is_err());
}

struct Never;

#[async_trait]
impl LocateStrategy for Never {
    fn name(&self) -> &'static str {
        "never"
    }

    async fn try_locate(
        &self,
        _doc: &dyn FrameDocument,
        _target: &ControlTarget,
    ) -> Result<Option<ElementSnapshot>, DomError> {
        Ok(None)
    }
}

#[tokio::test]
async fn test_custom_strategies() {
    let doc = MemoryDocument::new("about:blank");
    doc.append(None, Element::new("input").attr("value", "存查"));

    let loc = ElementLocator::with_strategies(
        ControlTarget::review_control(&PagesConfig::default()),
        vec![Box::new(Never), Box::new(ValueAttribute)],
    );
    let found = loc.locate(&doc).await.unwrap().unwrap();
    assert_eq!(found.strategy, "value-attribute");
}
