//! Mount-time translation of navigation parameters into table state.
//!
//! Recognised parameters:
//!
//! | Name           | Effect                                   | One-shot |
//! |----------------|------------------------------------------|----------|
//! | `filter`       | derived filter keyword                   | no       |
//! | `show_filters` | opens the filter panel                   | no       |
//! | `os`           | OS field filter                          | no       |
//! | `action=add`   | opens the add dialog                     | yes      |
//! | `selected`     | comma-separated ids selected on mount    | yes      |
//!
//! One-shot parameters are stripped from the location after they are read so
//! a refresh does not re-trigger them. The translation runs once; later state
//! changes are not written back.

use std::fmt;
use std::str::FromStr;

use fleet_model::{Field, ItemId};
use fleet_table::{DerivedFilter, FilterCriteria, SelectionSet};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

pub const PARAM_FILTER: &str = "filter";
pub const PARAM_SHOW_FILTERS: &str = "show_filters";
pub const PARAM_OS: &str = "os";
pub const PARAM_ACTION: &str = "action";
pub const PARAM_SELECTED: &str = "selected";
pub const ACTION_ADD: &str = "add";

/// Characters left unescaped in query components.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

// =============================================================================
// LOCATION
// =============================================================================

/// A navigable location: path, decoded query pairs and fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    params: Vec<(String, String)>,
    pub fragment: Option<String>,
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_string())),
            None => (raw, None),
        };
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let params = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode(name), decode(value))
            })
            .collect();
        Self {
            path: path.to_string(),
            params,
            fragment,
        }
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(key, _)| key == name)
    }

    /// Remove every occurrence of `name`. Returns whether any was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.params.len();
        self.params.retain(|(key, _)| key != name);
        self.params.len() != before
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for Location {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        for (index, (name, value)) in self.params.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            write!(
                f,
                "{separator}{}={}",
                utf8_percent_encode(name, QUERY_COMPONENT),
                utf8_percent_encode(value, QUERY_COMPONENT)
            )?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}

fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// Visibility flags owned by a table view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiFlags {
    pub show_filters: bool,
    pub add_dialog_open: bool,
}

/// Recognised navigation parameters of one location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationParams {
    pub filter: Option<DerivedFilter>,
    pub show_filters: bool,
    pub os: Option<String>,
    pub open_add_dialog: bool,
    pub selected: Vec<ItemId>,
}

impl NavigationParams {
    /// Read the recognised parameters. Unparsable values are logged and
    /// ignored; they never fail the mount.
    pub fn from_location(location: &Location) -> Self {
        let filter = location.get(PARAM_FILTER).and_then(|raw| {
            raw.parse::<DerivedFilter>()
                .inspect_err(|error| tracing::warn!(%error, "ignoring filter parameter"))
                .ok()
        });

        let os = location
            .get(PARAM_OS)
            .map(str::trim)
            .filter(|os| !os.is_empty())
            .map(str::to_string);

        let selected = location
            .get(PARAM_SELECTED)
            .map(parse_id_list)
            .unwrap_or_default();

        Self {
            filter,
            show_filters: location.get(PARAM_SHOW_FILTERS).is_some_and(is_truthy),
            os,
            open_add_dialog: location
                .get(PARAM_ACTION)
                .is_some_and(|action| action.eq_ignore_ascii_case(ACTION_ADD)),
            selected,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Translate into view state. An incoming filter also opens the filter
    /// panel so the active criteria are visible.
    pub fn apply(&self, criteria: &mut FilterCriteria, selection: &mut SelectionSet, ui: &mut UiFlags) {
        if let Some(filter) = self.filter {
            criteria.derived = Some(filter);
        }
        if let Some(os) = &self.os {
            criteria.set_field(Field::Os, os.as_str());
        }
        ui.show_filters |= self.show_filters || self.filter.is_some() || self.os.is_some();
        ui.add_dialog_open |= self.open_add_dialog;
        if !self.selected.is_empty() {
            selection.replace(self.selected.iter().copied());
        }
    }
}

/// Drop one-shot parameters. Returns whether the location changed.
pub fn strip_one_shot(location: &mut Location) -> bool {
    let action = location.remove(PARAM_ACTION);
    let selected = location.remove(PARAM_SELECTED);
    action || selected
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "1" | "true" | "yes" | "on"
    )
}

fn parse_id_list(raw: &str) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<ItemId>() {
            Ok(id) if !ids.contains(&id) => ids.push(id),
            Ok(_) => {}
            Err(error) => tracing::warn!(%error, "ignoring selected id"),
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_decodes_query() {
        let location = Location::parse("/hosts?os=Ubuntu%2022.04&filter=stale&q=a+b#top");
        assert_eq!(location.path, "/hosts");
        assert_eq!(location.get("os"), Some("Ubuntu 22.04"));
        assert_eq!(location.get("q"), Some("a b"));
        assert_eq!(location.fragment.as_deref(), Some("top"));
    }

    #[test]
    fn display_re_encodes() {
        let location = Location::parse("/hosts?os=Debian%2012&selected=1,2");
        assert_eq!(location.to_string(), "/hosts?os=Debian%2012&selected=1,2");
    }

    #[test]
    fn reads_recognised_parameters() {
        let location =
            Location::parse("/hosts?filter=needs-updates&show_filters=true&action=add&selected=3,1,x,3");
        let params = NavigationParams::from_location(&location);
        assert_eq!(params.filter, Some(DerivedFilter::NeedsUpdates));
        assert!(params.show_filters);
        assert!(params.open_add_dialog);
        assert_eq!(params.selected, [ItemId(3), ItemId(1)]);
    }

    #[test]
    fn unknown_values_are_ignored() {
        let location = Location::parse("/hosts?filter=bogus&show_filters=nope&action=edit&os=%20");
        assert!(NavigationParams::from_location(&location).is_empty());
    }

    #[test]
    fn strips_only_one_shot_parameters() {
        let mut location = Location::parse("/hosts?filter=stale&action=add&selected=1&os=rhel");
        assert!(strip_one_shot(&mut location));
        assert_eq!(location.to_string(), "/hosts?filter=stale&os=rhel");
        assert!(!strip_one_shot(&mut location));
    }

    #[test]
    fn apply_sets_state() {
        let params = NavigationParams {
            os: Some("Rocky".into()),
            selected: vec![ItemId(4)],
            ..NavigationParams::default()
        };
        let mut criteria = FilterCriteria::new();
        let mut selection = SelectionSet::new();
        let mut ui = UiFlags::default();
        params.apply(&mut criteria, &mut selection, &mut ui);

        assert_eq!(criteria.field(&Field::Os), Some("Rocky"));
        assert!(selection.has(ItemId(4)));
        assert!(ui.show_filters);
        assert!(!ui.add_dialog_open);
    }
}
