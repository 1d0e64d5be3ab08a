use super::consts::ELEMENT_LIST_NAME;
use crate::hfa::PairLayout;
use serde::{Deserialize, Serialize};

/// Options controlling how annotations are pulled out of an overlay.
///
/// # Examples
///
/// ```rust
/// use hfa_anno::annotation::ExtractOptions;
/// use hfa_anno::hfa::PairLayout;
///
/// let options = ExtractOptions::new()
///     .with_pair_layout(PairLayout::Planar)
///     .with_element_list("ElementList");
/// assert_eq!(options.pair_layout, PairLayout::Planar);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// How coordinate matrices pair up into points
    pub pair_layout: PairLayout,
    /// Name of the entry holding the annotation elements
    pub element_list: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pair_layout: PairLayout::default(),
            element_list: ELEMENT_LIST_NAME.to_string(),
        }
    }
}

impl ExtractOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the coordinate pairing convention.
    ///
    /// Overlays written with `Element_Eant` records store vertex blocks as
    /// two rows ([`PairLayout::Planar`]); `Element_2_Eant` overlays store
    /// rows of pairs ([`PairLayout::Interleaved`]).
    #[inline]
    pub fn with_pair_layout(mut self, layout: PairLayout) -> Self {
        self.pair_layout = layout;
        self
    }

    #[inline]
    pub fn with_element_list(mut self, name: impl Into<String>) -> Self {
        self.element_list = name.into();
        self
    }
}
