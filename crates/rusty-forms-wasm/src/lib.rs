//! rusty-forms WASM
//!
//! Browser bindings for rusty-forms. Exposes a `FormValidator` class that
//! listens for submit and focus events on the page document and validates
//! forms declared with `data-ref`, `data-required` and `data-type`.
//!
//! # Example (JavaScript)
//! ```javascript
//! import init, { FormValidator } from './rusty_forms_wasm.js';
//!
//! await init();
//! const validator = new FormValidator({ errorClass: 'has-error' });
//! validator.init({
//!     ajax: true,
//!     onValid: (form) => fetch(form.action, { method: 'POST', body: new FormData(form) }),
//!     onInvalid: () => console.log('fix the highlighted fields'),
//! });
//! ```

use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use js_sys::{Function, Object, Reflect};
use rusty_forms::{Callbacks, ConfigOverrides, FormValidator, ValidateError};
use rusty_forms_validation::{FieldInput, RuleEngine, RuleKind};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event};

pub mod dom;
pub mod renderer;

pub use dom::WebDom;
pub use renderer::JsRenderer;

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

pub(crate) fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

fn to_js(err: ValidateError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Option keys holding functions rather than config values
const FUNCTION_KEYS: [&str; 3] = ["onValid", "onInvalid", "render"];

#[derive(Default, Clone)]
struct JsCallbacks {
    on_valid: Option<Function>,
    on_invalid: Option<Function>,
}

impl JsCallbacks {
    fn layered(&self, later: &JsCallbacks) -> JsCallbacks {
        JsCallbacks {
            on_valid: later.on_valid.clone().or_else(|| self.on_valid.clone()),
            on_invalid: later.on_invalid.clone().or_else(|| self.on_invalid.clone()),
        }
    }

    fn call_valid(&self, form: &Element) {
        if let Some(on_valid) = &self.on_valid {
            if let Err(e) = on_valid.call1(&JsValue::NULL, form) {
                console_error(&format!("onValid threw: {:?}", e));
            }
        }
    }

    fn call_invalid(&self) {
        if let Some(on_invalid) = &self.on_invalid {
            if let Err(e) = on_invalid.call0(&JsValue::NULL) {
                console_error(&format!("onInvalid threw: {:?}", e));
            }
        }
    }
}

/// An options object split into config overrides and functions
struct JsOptions {
    overrides: ConfigOverrides,
    callbacks: JsCallbacks,
    render: Option<Function>,
}

fn parse_options(options: &JsValue) -> Result<JsOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(JsOptions {
            overrides: ConfigOverrides::new(),
            callbacks: JsCallbacks::default(),
            render: None,
        });
    }

    let function = |key: &str| {
        Reflect::get(options, &JsValue::from_str(key))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok())
    };
    let callbacks = JsCallbacks {
        on_valid: function("onValid"),
        on_invalid: function("onInvalid"),
    };
    let render = function("render");

    let rest = Object::assign(&Object::new(), options.unchecked_ref::<Object>());
    for key in FUNCTION_KEYS {
        Reflect::delete_property(&rest, &JsValue::from_str(key))?;
    }

    let overrides = serde_wasm_bindgen::from_value(rest.into())
        .map_err(|e| JsValue::from_str(&format!("Failed to parse options: {}", e)))?;

    Ok(JsOptions {
        overrides,
        callbacks,
        render,
    })
}

struct Inner {
    validator: FormValidator<WebDom>,
    dom: WebDom,
    instance: JsCallbacks,
    bound: JsCallbacks,
}

fn borrow(inner: &Rc<RefCell<Inner>>) -> Result<RefMut<'_, Inner>, JsValue> {
    inner
        .try_borrow_mut()
        .map_err(|_| JsValue::from_str("FormValidator is busy (called from inside a render function?)"))
}

struct Listener {
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn submit_listener(inner: &Rc<RefCell<Inner>>) -> Closure<dyn FnMut(Event)> {
    let inner = Rc::clone(inner);

    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(form) = event_element(&event) else {
            return;
        };
        let Ok(mut state) = inner.try_borrow_mut() else {
            console_warn("submit ignored while a validation pass is running");
            return;
        };

        let Inner { validator, dom, .. } = &mut *state;
        let outcome = validator.handle_submit(dom, &form);
        let callbacks = state.instance.layered(&state.bound);
        drop(state);

        // callbacks may call back into the validator
        match outcome {
            Ok(outcome) => {
                if outcome.prevents_default() {
                    event.prevent_default();
                }
                match outcome.is_valid() {
                    Some(true) => callbacks.call_valid(&form),
                    Some(false) => callbacks.call_invalid(),
                    None => {}
                }
            }
            Err(err) => {
                event.prevent_default();
                console_error(&format!("validation failed: {}", err));
            }
        }
    })
}

fn focus_listener(inner: &Rc<RefCell<Inner>>) -> Closure<dyn FnMut(Event)> {
    let inner = Rc::clone(inner);

    Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(field) = event_element(&event) else {
            return;
        };
        if let Ok(mut state) = inner.try_borrow_mut() {
            let Inner { validator, dom, .. } = &mut *state;
            validator.handle_focus(dom, &field);
        }
    })
}

/// Declarative form validator bound to the page document
#[wasm_bindgen(js_name = FormValidator)]
pub struct JsFormValidator {
    inner: Rc<RefCell<Inner>>,
    document: Document,
    listeners: Vec<Listener>,
}

#[wasm_bindgen(js_class = FormValidator)]
impl JsFormValidator {
    /// Create a validator. `options` are instance-level config overrides and
    /// may carry `onValid`, `onInvalid` and a `render(template, model)`
    /// function returning error markup.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsFormValidator, JsValue> {
        let dom = WebDom::from_window()
            .ok_or_else(|| JsValue::from_str("FormValidator requires a browser document"))?;
        let options = parse_options(&options)?;

        let mut validator = FormValidator::new().with_overrides(options.overrides);
        if let Some(render) = options.render {
            validator = validator.with_renderer(JsRenderer::new(render));
        }

        let document = dom.document().clone();
        let inner = Inner {
            validator,
            dom,
            instance: options.callbacks,
            bound: JsCallbacks::default(),
        };

        Ok(Self {
            inner: Rc::new(RefCell::new(inner)),
            document,
            listeners: Vec::new(),
        })
    }

    /// Bind the submit and focus handlers, replacing any earlier bindings
    pub fn init(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options = parse_options(&options)?;
        self.detach_all();

        {
            let mut state = borrow(&self.inner)?;
            state.validator.init(options.overrides, Callbacks::new());
            state.bound = options.callbacks;
        }

        let focus = focus_listener(&self.inner);
        self.attach("focusin", focus)?;
        let submit = submit_listener(&self.inner);
        self.attach("submit", submit)
    }

    /// Run a validation pass now
    #[wasm_bindgen(js_name = isValid)]
    pub fn is_valid(&self, options: JsValue) -> Result<bool, JsValue> {
        let options = parse_options(&options)?;
        let mut state = borrow(&self.inner)?;
        let Inner { validator, dom, .. } = &mut *state;

        validator.is_valid(dom, &options.overrides).map_err(to_js)
    }

    /// Bind only the handler that clears a field's error on focus
    #[wasm_bindgen(js_name = bindFields)]
    pub fn bind_fields(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options = parse_options(&options)?;
        borrow(&self.inner)?.validator.bind_fields(options.overrides);

        if self.listeners.iter().any(|l| l.event == "focusin") {
            return Ok(());
        }
        let focus = focus_listener(&self.inner);
        self.attach("focusin", focus)
    }

    /// Remove every handler this validator registered
    pub fn destroy(&mut self) -> Result<(), JsValue> {
        self.detach_all();

        let mut state = borrow(&self.inner)?;
        state.validator.destroy();
        state.bound = JsCallbacks::default();
        Ok(())
    }
}

impl JsFormValidator {
    fn attach(&mut self, event: &'static str, closure: Closure<dyn FnMut(Event)>) -> Result<(), JsValue> {
        self.document
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        self.listeners.push(Listener { event, closure });
        Ok(())
    }

    fn detach_all(&mut self) {
        for listener in self.listeners.drain(..) {
            let removed = self.document.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            );
            if removed.is_err() {
                console_warn(&format!("failed to remove {} listener", listener.event));
            }
        }
    }
}

impl Drop for JsFormValidator {
    fn drop(&mut self) {
        self.detach_all();
    }
}

/// Check a card number against the credit card pattern and the Luhn checksum
///
/// # Example (JavaScript)
/// ```javascript
/// isValidCreditCard('4111 1111 1111 1111'); // true
/// ```
#[wasm_bindgen(js_name = isValidCreditCard)]
pub fn is_valid_credit_card(value: &str) -> bool {
    RuleEngine::new()
        .rule(&RuleKind::CreditCard)
        .map_or(false, |rule| rule.check(value).is_none())
}

/// Evaluate one value the way a field with `data-type="{rule}"` would be.
///
/// Returns `"required"`, `"invalid"` or `"checksum"` on failure and
/// `undefined` when the value passes.
#[wasm_bindgen(js_name = checkRule)]
pub fn check_rule(rule: &str, value: &str, required: Option<bool>) -> Option<String> {
    let mut field = FieldInput::new(value).typed(RuleKind::parse(rule));
    if required.unwrap_or(false) {
        field = field.require();
    }

    RuleEngine::new()
        .evaluate(&field)
        .map(|kind| kind.as_str().to_string())
}
