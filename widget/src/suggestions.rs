//! Applying server suggestions to the product form.
//!
//! Text fields are filled only while blank, so a user-entered value is never
//! overwritten. Select fields accept a suggestion only when it exactly equals
//! an existing option. The destination select is the one deliberate
//! exception: the server's routing code wins even over a prior value,
//! matching the behavior of the system this widget feeds (see DESIGN.md).

use intake_protocol::DestinationCode;
use intake_protocol::SuggestionSet;

/// Free-text form field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    value: String,
}

impl TextField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// Set `candidate` only when the field is blank. Returns whether the
    /// field changed.
    pub fn fill_if_blank(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        if !self.is_blank() || candidate.is_empty() {
            return false;
        }
        self.value = candidate.to_string();
        true
    }
}

/// Single-choice form field backed by a fixed option list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectField {
    options: Vec<String>,
    value: String,
}

impl SelectField {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            value: String::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Select `candidate` when it exactly matches an existing option;
    /// anything else is silently ignored. Returns whether the field changed.
    pub fn select_exact(&mut self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        let Some(option) = self
            .options
            .iter()
            .find(|option| option.as_str() == candidate)
        else {
            return false;
        };
        self.value = option.clone();
        true
    }
}

/// The form fields the analysis can fill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub serial_number: TextField,
    pub asset_tag: TextField,
    pub description: TextField,
    pub subcategory: SelectField,
    pub destination: SelectField,
}

impl ProductForm {
    pub fn new(subcategory_options: Vec<String>, destination_options: Vec<String>) -> Self {
        Self {
            serial_number: TextField::default(),
            asset_tag: TextField::default(),
            description: TextField::default(),
            subcategory: SelectField::new(subcategory_options),
            destination: SelectField::new(destination_options),
        }
    }

    /// Merge one suggestion set into the form. Consumes nothing; callers drop
    /// the set afterwards.
    pub fn apply_suggestions(&mut self, suggestions: &SuggestionSet) {
        if let Some(serial) = non_blank(suggestions.serial_number.as_deref()) {
            self.serial_number.fill_if_blank(serial);
        }
        if let Some(tag) = non_blank(suggestions.asset_tag.as_deref()) {
            self.asset_tag.fill_if_blank(tag);
        }

        // Short description first, raw description text as fallback.
        let description = non_blank(suggestions.short_description.as_deref())
            .or_else(|| non_blank(suggestions.description_raw.as_deref()));
        if let Some(description) = description {
            self.description.fill_if_blank(description);
        }

        if self.subcategory.is_blank()
            && let Some(subcategory) = non_blank(suggestions.subcategory.as_deref())
        {
            self.subcategory.select_exact(subcategory);
        }

        // Destination bypasses the blank guard: the code, then the label.
        let matched = suggestions
            .cod_destiny
            .as_ref()
            .map(DestinationCode::canonical)
            .is_some_and(|code| !code.is_empty() && self.destination.select_exact(&code));
        if !matched
            && let Some(label) = non_blank(suggestions.destination_label.as_deref())
        {
            self.destination.select_exact(label);
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
