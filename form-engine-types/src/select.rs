use std::fmt;
use std::sync::Arc;

use crate::{FieldValue, FormData};

/// Sentinel value of a select box with nothing selected.
pub const UNSET: &str = "unset";

/// Computes the options of a dependent select box from the current form data.
pub type OptionsFn = Arc<dyn Fn(&FormData) -> Vec<SelectOption> + Send + Sync>;

/// One entry of a select box.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    /// The value stored in the form when this option is chosen.
    pub value: FieldValue,

    /// Display text.
    pub text: String,

    /// Optional second line (card and custom selects show it).
    pub secondary_text: Option<String>,

    /// Hidden options are kept in the list but not offered.
    pub hidden: bool,

    /// Disabled options are shown but cannot be chosen.
    pub disabled: bool,
}

impl SelectOption {
    /// Create a new option.
    pub fn new(value: impl Into<FieldValue>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
            secondary_text: None,
            hidden: false,
            disabled: false,
        }
    }

    /// The synthetic "nothing selected" entry.
    pub fn placeholder(text: impl Into<String>, hidden: bool) -> Self {
        Self {
            hidden,
            ..Self::new(UNSET, text)
        }
    }

    /// Set the secondary text.
    pub fn with_secondary_text(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }

    /// Mark the option as disabled.
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Check if this is the "nothing selected" entry.
    pub fn is_placeholder(&self) -> bool {
        self.value.as_str() == Some(UNSET)
    }
}

/// Which control renders a select box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SelectElement {
    /// Native-style dropdown.
    #[default]
    Default,
    /// Searchable custom dropdown.
    Custom,
    /// One card per option.
    Cards,
    /// Two-state switch for exactly two options.
    DualSwitch,
}

/// Where a select box gets its options from.
#[derive(Clone)]
pub enum OptionSource {
    /// A fixed list of options.
    Fixed(Vec<SelectOption>),

    /// Options recomputed whenever one of `dependencies` changes.
    Dependent {
        dependencies: Vec<String>,
        get_options: OptionsFn,
    },
}

impl fmt::Debug for OptionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(options) => f.debug_tuple("Fixed").field(options).finish(),
            Self::Dependent { dependencies, .. } => f
                .debug_struct("Dependent")
                .field("dependencies", dependencies)
                .finish_non_exhaustive(),
        }
    }
}

/// Configuration for a select box field.
#[derive(Debug, Clone)]
pub struct SelectBoxConfig {
    /// Fixed or dependent options.
    pub source: OptionSource,

    /// Whether several options can be chosen (the value is then a list).
    pub multiple: bool,

    /// Show a search box.
    pub search: bool,

    /// Search on the server side instead of filtering loaded options.
    pub large_data_search: bool,

    /// The control used to render the select box.
    pub element: SelectElement,

    /// Value preselected in create mode.
    pub default: Option<FieldValue>,
}

impl SelectBoxConfig {
    fn with_source(source: OptionSource) -> Self {
        Self {
            source,
            multiple: false,
            search: false,
            large_data_search: false,
            element: SelectElement::Default,
            default: None,
        }
    }

    /// A select box with a fixed list of options.
    pub fn fixed(options: Vec<SelectOption>) -> Self {
        Self::with_source(OptionSource::Fixed(options))
    }

    /// A select box whose options depend on other fields.
    pub fn dependent<I, S, F>(dependencies: I, get_options: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&FormData) -> Vec<SelectOption> + Send + Sync + 'static,
    {
        Self::with_source(OptionSource::Dependent {
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            get_options: Arc::new(get_options),
        })
    }

    /// Allow several selections.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Show a search box.
    pub fn searchable(mut self) -> Self {
        self.search = true;
        self
    }

    /// Search on the server side.
    pub fn large_data_search(mut self) -> Self {
        self.search = true;
        self.large_data_search = true;
        self
    }

    /// Pick the rendering control.
    pub fn element(mut self, element: SelectElement) -> Self {
        self.element = element;
        self
    }

    /// Preselect a value.
    pub fn with_default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Names of the fields this select box depends on (empty when fixed).
    pub fn dependencies(&self) -> &[String] {
        match &self.source {
            OptionSource::Fixed(_) => &[],
            OptionSource::Dependent { dependencies, .. } => dependencies,
        }
    }

    /// Check if options are recomputed from other fields.
    pub fn is_dependent(&self) -> bool {
        matches!(self.source, OptionSource::Dependent { .. })
    }
}
