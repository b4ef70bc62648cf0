//! Demo contact form: inline validation and a simulated successful send.
//!
//! Nothing is ever transmitted. A valid submission shows a success banner
//! for five seconds and resets the form after two.

use anyhow::Result;
use core::time::Duration;
use dom::{Document, NodeKey};
use log::{debug, info};
use page_runtime::{EventKind, EventTarget, Page};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::LazyLock;

pub const FORM_ID: &str = "contactForm";
pub const CONTROLS: &str = "input, select, textarea";

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const SUCCESS_TITLE: &str = "Message sent successfully!";
pub const SUCCESS_NOTICE: &str =
    "This is a demo form. Please use direct contact methods for actual inquiries.";

pub const BANNER_LIFETIME: Duration = Duration::from_millis(5000);
pub const RESET_DELAY: Duration = Duration::from_millis(2000);

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// `local@domain.tld` with no whitespace and exactly one `@` per part.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL.as_ref().is_some_and(|pattern| pattern.is_match(value))
}

/// The message a field currently fails with, if any.
pub fn field_error(doc: &Document, field: NodeKey) -> Option<&'static str> {
    let value = doc.value(field);
    let value = value.trim();
    if doc.has_attribute(field, "required") && value.is_empty() {
        return Some(REQUIRED_MESSAGE);
    }
    let is_email = doc.control_type(field).as_deref() == Some("email");
    if is_email && !value.is_empty() && !is_valid_email(value) {
        return Some(EMAIL_MESSAGE);
    }
    None
}

/// Feedback messages on display, keyed by the field they describe.
///
/// Several controls may share one wrapper element, so a message is found
/// through its field rather than by searching the wrapper.
#[derive(Debug, Default)]
pub struct FieldErrors {
    shown: HashMap<NodeKey, NodeKey>,
}

impl FieldErrors {
    /// Drop the invalid marker and the feedback message of `field` only.
    ///
    /// # Errors
    /// Returns an error if the field was removed from the document.
    pub fn clear(&mut self, page: &mut Page, field: NodeKey) -> Result<()> {
        let doc = page.document_mut();
        doc.remove_class(field, "is-invalid")?;
        if let Some(feedback) = self.shown.remove(&field)
            && doc.contains(feedback)
        {
            doc.remove_node(feedback)?;
        }
        Ok(())
    }

    fn show(&mut self, page: &mut Page, field: NodeKey, message: &str) -> Result<()> {
        let doc = page.document_mut();
        doc.add_class(field, "is-invalid")?;
        let Some(parent) = doc.parent_element(field) else {
            return Ok(());
        };
        let feedback = doc.create_element("div");
        doc.set_attribute(feedback, "class", "invalid-feedback d-block")?;
        doc.set_text_content(feedback, message)?;
        doc.append_child(parent, feedback)?;
        self.shown.insert(field, feedback);
        Ok(())
    }

    /// Re-validate one field, replacing its previous message. Returns whether it passed.
    ///
    /// # Errors
    /// Returns an error if the field was removed from the document.
    pub fn validate(&mut self, page: &mut Page, field: NodeKey) -> Result<bool> {
        self.clear(page, field)?;
        match field_error(page.document(), field) {
            Some(message) => {
                self.show(page, field, message)?;
                Ok(false)
            }
            None => Ok(true),
        }
    }

    /// Validate every field without stopping at the first failure.
    ///
    /// # Errors
    /// Returns an error if a field was removed from the document.
    pub fn validate_all(&mut self, page: &mut Page, fields: &[NodeKey]) -> Result<bool> {
        let mut valid = true;
        for field in fields {
            valid &= self.validate(page, *field)?;
        }
        Ok(valid)
    }

    fn clear_all(&mut self, page: &mut Page, fields: &[NodeKey]) -> Result<()> {
        for field in fields {
            if page.document().contains(*field) {
                self.clear(page, *field)?;
            }
        }
        Ok(())
    }
}

fn show_success(page: &mut Page, form: NodeKey) -> Result<()> {
    let doc = page.document_mut();
    let banner = doc.create_element("div");
    doc.set_attribute(banner, "class", "alert alert-success mt-3")?;
    let icon = doc.create_element("i");
    doc.set_attribute(icon, "class", "fas fa-check-circle me-2")?;
    let title = doc.create_element("strong");
    doc.set_text_content(title, SUCCESS_TITLE)?;
    let notice = doc.create_text(&format!(" {SUCCESS_NOTICE}"));
    doc.append_child(banner, icon)?;
    doc.append_child(banner, title)?;
    doc.append_child(banner, notice)?;
    doc.append_child(form, banner)?;
    page.set_timeout(BANNER_LIFETIME, move |page| {
        if page.document().contains(banner) {
            page.document_mut().remove_node(banner)?;
        }
        Ok(())
    });
    Ok(())
}

/// # Errors
/// Propagates selector failures.
pub fn init(page: &mut Page) -> Result<()> {
    let Some(form) = page.document().get_element_by_id(FORM_ID) else {
        debug!("no #{FORM_ID} on this page");
        return Ok(());
    };
    let fields: Rc<[NodeKey]> = page.document().query_selector_all_within(form, CONTROLS)?.into();
    let errors = Rc::new(RefCell::new(FieldErrors::default()));
    for field in fields.iter().copied() {
        let on_blur = Rc::clone(&errors);
        page.add_event_listener(EventTarget::Node(field), EventKind::Blur, move |page, _| {
            on_blur.borrow_mut().validate(page, field).map(drop)
        });
        let on_input = Rc::clone(&errors);
        page.add_event_listener(EventTarget::Node(field), EventKind::Input, move |page, _| {
            on_input.borrow_mut().clear(page, field)
        });
    }
    page.add_event_listener(EventTarget::Node(form), EventKind::Submit, move |page, event| {
        event.prevent_default();
        if !errors.borrow_mut().validate_all(page, &fields)? {
            debug!("contact form has invalid fields");
            return Ok(());
        }
        info!("demo contact form accepted; nothing is sent");
        show_success(page, form)?;
        let fields = Rc::clone(&fields);
        let errors = Rc::clone(&errors);
        page.set_timeout(RESET_DELAY, move |page| {
            if page.document().contains(form) {
                page.document_mut().reset_form(form)?;
            }
            errors.borrow_mut().clear_all(page, &fields)
        });
        Ok(())
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::is_valid_email;

    #[test]
    fn email_pattern_matches_simple_addresses() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.io"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ada@@example.com"));
    }
}
