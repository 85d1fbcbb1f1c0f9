//! [`MemoryDocument`] builders for the two known pages.
//!
//! The markup mirrors what the document system renders: an iCheck-skinned
//! checkbox per list row and a review control that reloads the list, and an
//! archive form whose case sequence options arrive after the file code
//! changes.

use std::sync::Arc;

use crate::dom::{DomEvent, NodeRef};
use crate::memory::{Element, MemoryDocument, Reaction};

pub const LIST_URL: &str = "https://edoc.example.gov.tw/AOS/AOSDA006F_s02.jsp";
pub const ARCHIVE_URL: &str = "https://edoc.example.gov.tw/AOS/AOSDA062F_s18.jsp";

/// Review list page.
pub struct ListPageFixture {
    pub doc: Arc<MemoryDocument>,
    pub container: NodeRef,
    pub checkboxes: Vec<NodeRef>,
    pub review_control: Option<NodeRef>,
}

impl ListPageFixture {
    /// List with one row per entry of `checked`. `review_name` is the `name`
    /// of the review control; `None` renders no control at all.
    pub fn build(checked: &[bool], review_name: Option<&str>) -> Self {
        let doc = Arc::new(MemoryDocument::new(LIST_URL));
        let container = doc.append(None, Element::new("div").id("listContainer"));
        let table = doc.append(Some(container), Element::new("table"));
        let body = doc.append(Some(table), Element::new("tbody").id("listTBODY"));

        let checkboxes = checked
            .iter()
            .enumerate()
            .map(|(i, &is_checked)| {
                let row = doc.append(Some(body), Element::new("tr"));
                let cell = doc.append(Some(row), Element::new("td"));
                let skin = doc.append(Some(cell), Element::new("div").class("icheckbox_minimal-orange"));
                doc.append(
                    Some(skin),
                    Element::new("input")
                        .attr("type", "checkbox")
                        .attr("name", "ids")
                        .attr("value", &format!("1130{:05}", i + 1))
                        .checked(is_checked),
                )
            })
            .collect();

        let review_control = review_name.map(|name| {
            let control = doc.append(
                None,
                Element::new("input")
                    .attr("type", "button")
                    .attr("name", name)
                    .attr("value", "存查"),
            );
            doc.on(control, DomEvent::Click, Reaction::Reload);
            control
        });

        Self {
            doc,
            container,
            checkboxes,
            review_control,
        }
    }

    /// `n` unchecked rows and the review control under its most common name.
    pub fn unchecked(n: usize) -> Self {
        Self::build(&vec![false; n], Some("000011803"))
    }
}

/// Archive filing form.
pub struct ArchivePageFixture {
    pub doc: Arc<MemoryDocument>,
    pub file_code: NodeRef,
    pub case_sequence: NodeRef,
    pub confirm: NodeRef,
}

impl ArchivePageFixture {
    /// Form whose case sequence select is filled with `case_options` once the
    /// file code changes. Confirming navigates back to the list page.
    pub fn build(file_codes: &[&str], case_options: &[&str]) -> Self {
        let doc = Arc::new(MemoryDocument::new(ARCHIVE_URL));
        let form = doc.append(None, Element::new("form").attr("name", "archiveForm"));

        let mut codes = vec![""];
        codes.extend_from_slice(file_codes);
        let file_code = doc.append(
            Some(form),
            Element::new("select").attr("name", "q_fsKindno").options(&codes),
        );
        let case_sequence = doc.append(
            Some(form),
            Element::new("select").attr("name", "q_caseno").options(&[""]),
        );
        let confirm = doc.append(
            Some(form),
            Element::new("input")
                .attr("type", "button")
                .attr("name", "updateSubmit")
                .attr("value", "確定存檔"),
        );

        let mut loaded = vec![String::new()];
        loaded.extend(case_options.iter().map(|o| o.to_string()));
        doc.on(
            file_code,
            DomEvent::Change,
            Reaction::SetOptions {
                select: case_sequence,
                options: loaded,
            },
        );
        doc.on(confirm, DomEvent::Click, Reaction::Navigate(LIST_URL.to_string()));

        Self {
            doc,
            file_code,
            case_sequence,
            confirm,
        }
    }

    /// Form offering the default file code with case sequences 1 to 3.
    pub fn standard() -> Self {
        Self::build(&["03010101", "03010102"], &["1", "2", "3"])
    }
}
