//! End-to-end validation scenarios against the in-memory document
//!
//! Each test builds a small page, drives the validator through the same
//! entry points a browser host uses (submit, focus, direct calls) and
//! inspects the markers left in the document.

use pretty_assertions::assert_eq;
use rstest::rstest;
use rusty_forms::{
    Callbacks, ConfigOverrides, Dom, FailureKind, FormValidator, MemoryDom, NodeId, ScrollTarget,
    SubmitOutcome,
};
use std::cell::Cell;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct Page {
    dom: MemoryDom,
    form: NodeId,
}

impl Page {
    fn new() -> Self {
        init_tracing();
        let mut dom = MemoryDom::new();
        let root = dom.root();
        let form = dom.append_element(&root, "form", &[("data-ref", "form"), ("id", "checkout")]);
        Self { dom, form }
    }

    fn field(&mut self, attrs: &[(&str, &str)], value: &str) -> NodeId {
        let mut all = vec![("data-ref", "formField")];
        all.extend_from_slice(attrs);
        let form = self.form;
        let field = self.dom.append_element(&form, "input", &all);
        self.dom.set_value(&field, value);
        field
    }

    fn markers(&self) -> Vec<NodeId> {
        self.dom.query("ref:formError", &[])
    }

    fn marker_texts(&self) -> Vec<String> {
        self.markers()
            .iter()
            .map(|marker| self.dom.text(marker).to_string())
            .collect()
    }
}

#[test]
fn required_empty_field_blocks_submit_and_scrolls_to_top() {
    let mut page = Page::new();
    page.field(&[("data-required", "")], "");
    let mut validator = FormValidator::new();
    validator.init(ConfigOverrides::new(), Callbacks::new());

    let form = page.form;
    let outcome = validator.handle_submit(&mut page.dom, &form).unwrap();

    assert_eq!(outcome, SubmitOutcome::Prevented { valid: false });
    assert_eq!(page.markers().len(), 1);
    assert_eq!(page.dom.scroll_requests(), &[0.0]);
}

#[test]
fn valid_credit_card_passes_without_markers() {
    let mut page = Page::new();
    page.field(&[("data-required", ""), ("data-type", "creditCard")], "4111111111111111");
    let mut validator = FormValidator::new();

    assert!(validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());
    assert!(page.markers().is_empty());
    assert!(page.dom.scroll_requests().is_empty());
}

#[test]
fn invalid_email_renders_format_marker() {
    let mut page = Page::new();
    page.field(
        &[("data-required", ""), ("data-type", "email"), ("data-label", "Email")],
        "not-an-email",
    );
    let mut validator = FormValidator::new();

    let report = validator.validate(&mut page.dom, &ConfigOverrides::new()).unwrap();

    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].kind, FailureKind::InvalidFormat);
    assert_eq!(page.marker_texts(), vec!["Please enter a valid email".to_string()]);
}

#[test]
fn destroyed_validator_lets_form_submit_natively() {
    let mut page = Page::new();
    page.field(&[("data-required", "")], "");
    let invalid_calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&invalid_calls);
    let mut validator = FormValidator::new();
    validator.init(
        ConfigOverrides::new(),
        Callbacks::new().on_invalid(move || counter.set(counter.get() + 1)),
    );

    validator.destroy();
    let form = page.form;
    let outcome = validator.handle_submit(&mut page.dom, &form).unwrap();

    assert_eq!(outcome, SubmitOutcome::Unhandled);
    assert!(!outcome.prevents_default());
    assert_eq!(invalid_calls.get(), 0);
    assert!(page.markers().is_empty());
}

#[test]
fn repeated_passes_leave_identical_markers() {
    let mut page = Page::new();
    let name = page.field(&[("data-required", "")], "  ");
    let zip = page.field(&[("data-type", "zip")], "1234");
    let form = page.form;
    let label = page.dom.append_element(&form, "label", &[]);
    let mut validator = FormValidator::new();

    validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap();
    let first = page.marker_texts();
    validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap();
    let second = page.marker_texts();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert!(page.dom.has_class(&name, "-error"));
    assert!(page.dom.has_class(&zip, "-error"));
    assert!(page.dom.has_class(&label, "-error"));
}

#[test]
fn repeated_failing_passes_keep_document_size_steady() {
    let mut page = Page::new();
    page.field(&[("data-required", "")], "");
    let mut validator = FormValidator::new();

    validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap();
    let settled = page.dom.node_count();
    for _ in 0..1000 {
        validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap();
    }

    assert_eq!(page.dom.node_count(), settled);
    assert_eq!(page.markers().len(), 1);
}

#[test]
fn fixing_a_field_clears_its_marker_on_next_pass() {
    let mut page = Page::new();
    let name = page.field(&[("data-required", "")], "");
    let mut validator = FormValidator::new();

    assert!(!validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());
    page.dom.set_value(&name, "Ada");
    assert!(validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());

    assert!(page.markers().is_empty());
    assert!(!page.dom.has_class(&name, "-error"));
}

#[rstest]
#[case("")]
#[case(" ")]
#[case("\t\n")]
fn every_empty_required_field_gets_one_marker(#[case] blank: &str) {
    let mut page = Page::new();
    for _ in 0..3 {
        page.field(&[("data-required", "")], blank);
    }
    let mut validator = FormValidator::new();

    let report = validator.validate(&mut page.dom, &ConfigOverrides::new()).unwrap();

    assert_eq!(report.errors.len(), 3);
    assert!(report
        .errors
        .iter()
        .all(|record| record.kind == FailureKind::MissingRequiredValue));
    assert_eq!(page.markers().len(), 3);
}

#[test]
fn focus_clears_only_the_focused_field() {
    let mut page = Page::new();
    let a = page.field(&[("data-required", "")], "");
    let b = page.field(&[("data-required", "")], "");
    let mut validator = FormValidator::new();
    validator.init(ConfigOverrides::new(), Callbacks::new());

    let form = page.form;
    validator.handle_submit(&mut page.dom, &form).unwrap();
    let b_marker = validator.errors()[1].node.unwrap();

    assert!(validator.handle_focus(&mut page.dom, &a));

    assert!(!page.dom.has_class(&a, "-error"));
    assert!(page.dom.has_class(&b, "-error"));
    assert_eq!(page.markers(), vec![b_marker]);
}

#[test]
fn focus_clears_global_contribution_without_deactivating_container() {
    let mut page = Page::new();
    let root = page.dom.root();
    let summary = page.dom.append_element(&root, "div", &[("data-ref", "formErrors")]);
    let a = page.field(&[("data-required", "")], "");
    page.field(&[("data-required", "")], "");
    let options = ConfigOverrides::new().global_errors_selector("ref:formErrors");
    let mut validator = FormValidator::new();
    validator.init(options.clone(), Callbacks::new());

    assert!(!validator.is_valid(&mut page.dom, &options).unwrap());
    assert_eq!(page.dom.children(&summary).len(), 2);

    validator.handle_focus(&mut page.dom, &a);

    assert_eq!(page.dom.children(&summary).len(), 1);
    assert!(page.dom.has_class(&summary, "-is-active"));
}

#[rstest]
#[case(true)]
#[case(false)]
fn disabled_scroll_never_requests_scrolling(#[case] valid: bool) {
    let mut page = Page::new();
    page.field(&[("data-required", "")], if valid { "filled" } else { "" });
    let mut validator = FormValidator::new();

    let options = ConfigOverrides::new().scroll_top(ScrollTarget::Disabled);
    assert_eq!(validator.is_valid(&mut page.dom, &options).unwrap(), valid);
    assert!(page.dom.scroll_requests().is_empty());
}

#[test]
fn selector_scroll_targets_element_offset() {
    let mut page = Page::new();
    let form = page.form;
    page.dom.set_offset_top(&form, 480.0);
    page.field(&[("data-required", "")], "");
    let mut validator = FormValidator::new();

    let options = ConfigOverrides::new().scroll_top(ScrollTarget::Selector("#checkout".to_string()));
    validator.is_valid(&mut page.dom, &options).unwrap();

    assert_eq!(page.dom.scroll_requests(), &[480.0]);
}

#[test]
fn dynamically_added_fields_are_seen_on_next_pass() {
    let mut page = Page::new();
    let mut validator = FormValidator::new();

    assert!(validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());
    let late = page.field(&[("data-required", "")], "");
    assert!(!validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());

    page.dom.remove(&late);
    assert!(validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());
    assert!(page.markers().is_empty());
}

#[test]
fn custom_rule_participates_in_passes() {
    let mut page = Page::new();
    page.field(&[("data-type", "sku"), ("data-label", "SKU")], "abc");
    let mut validator = FormValidator::new();

    // unregistered: accepted
    assert!(validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());

    validator
        .rules_mut()
        .register("sku", r"^[A-Z]{3}-[0-9]{4}$", "product code")
        .unwrap();
    assert!(!validator.is_valid(&mut page.dom, &ConfigOverrides::new()).unwrap());
    assert_eq!(page.marker_texts(), vec!["Please enter a valid product code".to_string()]);
}

#[test]
fn valid_submit_calls_on_valid_with_form() {
    let mut page = Page::new();
    page.field(&[("data-required", ""), ("data-type", "cvv")], "123");
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    let mut validator = FormValidator::new();
    validator.init(
        ConfigOverrides::new(),
        Callbacks::new().on_valid(move |form: &NodeId| sink.set(Some(*form))),
    );

    let form = page.form;
    let outcome = validator.handle_submit(&mut page.dom, &form).unwrap();

    assert_eq!(outcome, SubmitOutcome::Submit);
    assert_eq!(seen.get(), Some(form));
}
