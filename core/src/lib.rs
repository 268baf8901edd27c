use std::path::{Path, PathBuf};

use convert_case::{Boundary, Case, Casing};
use expression::{Expression, Value};
use extensions::Extensions;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Map;

pub mod error;
pub mod expression;
pub mod extensions;
pub mod reconstruct;
pub mod scss;
pub mod store;
pub mod typescript;

pub use error::{Error, Result};
use scss::FlatVariable;
use store::FileStore;

/// A merged token tree, built from one or more JSON sources.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct DesignTokens {
    pub root: IndexMap<String, TokenOrGroup>,
}

/// Selects which tokens end up in a generated file.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenFilter<'a> {
    /// Only tokens whose first path segment is this component.
    pub component: Option<&'a str>,
    /// Only tokens without a `mode` or with this `mode`.
    pub theme: Option<&'a str>,
}
impl TokenFilter<'_> {
    fn accepts(&self, path: &[String], extensions: Option<&Extensions>) -> bool {
        let in_component = self
            .component
            .map_or(true, |component| path.first().map(String::as_str) == Some(component));
        let in_theme = match (self.theme, extensions) {
            (Some(theme), Some(extensions)) => extensions.applies_to(theme),
            _ => true,
        };
        in_component && in_theme
    }
}

impl DesignTokens {
    /// Reads every source in order and deep-merges them; later files win.
    pub fn load(store: &impl FileStore, sources: &[PathBuf]) -> Result<Self> {
        let mut merged = serde_json::Value::Object(Map::new());
        for source in sources {
            log::debug!("reading token source {}", source.display());
            let text = store.read_to_string(source)?;
            let value: serde_json::Value =
                serde_json::from_str(&text).map_err(|err| json_error(source, err))?;
            merge_json(&mut merged, value);
        }
        Self::from_json(merged, sources.last().map_or(Path::new(""), PathBuf::as_path))
    }
    pub fn from_json(mut value: serde_json::Value, origin: &Path) -> Result<Self> {
        strip_group_metadata(&mut value);
        serde_json::from_value(value).map_err(|err| json_error(origin, err))
    }
    /// Every variable accepted by `filter`, in source order.
    pub fn flatten(&self, filter: &TokenFilter) -> Result<Vec<FlatVariable>> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for (key, node) in &self.root {
            path.push(key.clone());
            node.flatten(self, filter, &mut path, &mut out)?;
            path.pop();
        }
        Ok(out)
    }
    /// The filtered tree with every value resolved, as an ES module.
    pub fn to_es_module(&self, filter: &TokenFilter) -> Result<String> {
        let mut path = Vec::new();
        let mut tree = Map::new();
        for (key, node) in &self.root {
            path.push(key.clone());
            if let Some(value) = node.to_json(self, filter, &mut path)? {
                tree.insert(key.clone(), value);
            }
            path.pop();
        }
        let tokens = serde_json::to_string_pretty(&tree)?;
        Ok(format!("export const tokens = {tokens} as const;\n"))
    }
    /// Resolves the single value at `path`, following references.
    pub(crate) fn resolve(&self, path: &[String], stack: &mut Vec<String>) -> Result<Value> {
        let key = path.join(".");
        if stack.contains(&key) {
            return Err(Error::CircularReference(key));
        }
        stack.push(key);
        let value = self.resolve_unchecked(path, stack);
        stack.pop();
        value
    }
    fn resolve_unchecked(&self, path: &[String], stack: &mut Vec<String>) -> Result<Value> {
        let unresolved = || Error::UnresolvedReference(path.join("."));
        let (first, rest) = path.split_first().ok_or_else(unresolved)?;
        let mut node = self.root.get(first).ok_or_else(unresolved)?;
        for (i, segment) in rest.iter().enumerate() {
            match node {
                TokenOrGroup::Group(group) => {
                    node = group.get(segment).ok_or_else(unresolved)?;
                }
                TokenOrGroup::Token {
                    value: TokenValue::Dict(dict),
                    ..
                } if i + 1 == rest.len() => {
                    return dict.get(segment).ok_or_else(unresolved)?.get_value(self, stack);
                }
                TokenOrGroup::Token { .. } => return Err(unresolved()),
            }
        }
        match node {
            TokenOrGroup::Token { .. } => node.single_value(self, path, stack),
            TokenOrGroup::Group(_) => Err(unresolved()),
        }
    }
}

fn json_error(path: &Path, source: serde_json::Error) -> Error {
    Error::Json {
        path: path.to_path_buf(),
        source,
    }
}

/// Drops `$type`, `$description` and similar keys set on groups rather
/// than on tokens.
fn strip_group_metadata(value: &mut serde_json::Value) {
    if let serde_json::Value::Object(map) = value {
        if map.contains_key("value") || map.contains_key("$value") {
            return;
        }
        map.retain(|key, _| !key.starts_with('$'));
        for child in map.values_mut() {
            strip_group_metadata(child);
        }
    }
}

/// Objects merge key by key; anything else is replaced.
pub fn merge_json(target: &mut serde_json::Value, source: serde_json::Value) {
    match (target, source) {
        (serde_json::Value::Object(target), serde_json::Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Token types that change how composite values are named.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Border,
    Typography,
    Color,
    #[default]
    Other,
}
impl TokenType {
    pub fn from_name(name: Option<&str>) -> Self {
        match name {
            Some("border") => TokenType::Border,
            Some("typography") => TokenType::Typography,
            Some("color") => TokenType::Color,
            _ => TokenType::Other,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenOrGroup {
    Token {
        #[serde(alias = "$value")]
        value: TokenValue,
        #[serde(rename = "type", alias = "$type")]
        type_: Option<String>,
        #[serde(alias = "$description")]
        description: Option<String>,
        #[serde(rename = "$extensions")]
        extensions: Option<Extensions>,
    },
    Group(IndexMap<String, TokenOrGroup>),
}
impl TokenOrGroup {
    fn flatten(
        &self,
        tokens: &DesignTokens,
        filter: &TokenFilter,
        path: &mut Vec<String>,
        out: &mut Vec<FlatVariable>,
    ) -> Result<()> {
        match self {
            TokenOrGroup::Token {
                value,
                type_,
                description,
                extensions,
            } => {
                if !filter.accepts(path, extensions.as_ref()) {
                    return Ok(());
                }
                let name = variable_name(path);
                match value {
                    TokenValue::Single(_) => out.push(FlatVariable {
                        name,
                        value: self.single_value(tokens, path, &mut Vec::new())?.to_css(),
                        comment: description.clone(),
                    }),
                    TokenValue::Dict(dict) => {
                        for (key, expr) in dict {
                            out.push(FlatVariable {
                                name: format!(
                                    "{name}-{}",
                                    css_property(TokenType::from_name(type_.as_deref()), key)
                                ),
                                value: expr.get_value(tokens, &mut Vec::new())?.to_css(),
                                comment: None,
                            });
                        }
                    }
                }
            }
            TokenOrGroup::Group(group) => {
                for (key, node) in group {
                    path.push(key.clone());
                    node.flatten(tokens, filter, path, out)?;
                    path.pop();
                }
            }
        }
        Ok(())
    }
    fn to_json(
        &self,
        tokens: &DesignTokens,
        filter: &TokenFilter,
        path: &mut Vec<String>,
    ) -> Result<Option<serde_json::Value>> {
        match self {
            TokenOrGroup::Token {
                value,
                type_,
                description,
                extensions,
            } => {
                if !filter.accepts(path, extensions.as_ref()) {
                    return Ok(None);
                }
                let value = match value {
                    TokenValue::Single(_) => serde_json::Value::String(
                        self.single_value(tokens, path, &mut Vec::new())?.to_css(),
                    ),
                    TokenValue::Dict(dict) => {
                        let mut map = Map::new();
                        for (key, expr) in dict {
                            let value = expr.get_value(tokens, &mut Vec::new())?.to_css();
                            map.insert(key.clone(), serde_json::Value::String(value));
                        }
                        serde_json::Value::Object(map)
                    }
                };
                let mut token = Map::new();
                token.insert("value".to_string(), value);
                if let Some(type_) = type_ {
                    token.insert("type".to_string(), type_.clone().into());
                }
                if let Some(description) = description {
                    token.insert("description".to_string(), description.clone().into());
                }
                token.insert("name".to_string(), variable_name(path).into());
                token.insert("path".to_string(), path.clone().into());
                Ok(Some(serde_json::Value::Object(token)))
            }
            TokenOrGroup::Group(group) => {
                let mut map = Map::new();
                for (key, node) in group {
                    path.push(key.clone());
                    if let Some(value) = node.to_json(tokens, filter, path)? {
                        map.insert(key.clone(), value);
                    }
                    path.pop();
                }
                Ok((!map.is_empty()).then_some(serde_json::Value::Object(map)))
            }
        }
    }
    /// The resolved value of a single-valued token, modifiers applied.
    fn single_value(
        &self,
        tokens: &DesignTokens,
        path: &[String],
        stack: &mut Vec<String>,
    ) -> Result<Value> {
        match self {
            TokenOrGroup::Token {
                value: TokenValue::Single(expr),
                extensions,
                ..
            } => {
                let value = expr.get_value(tokens, stack)?;
                match extensions
                    .as_ref()
                    .and_then(|ext| ext.studio_tokens.as_ref())
                    .and_then(|studio| studio.modify.as_ref())
                {
                    Some(modifier) => modifier.apply(&path.join("."), value, tokens, stack),
                    None => Ok(value),
                }
            }
            _ => Err(Error::CompositeValue(path.join("."))),
        }
    }
}

fn css_property(type_: TokenType, key: &str) -> String {
    match type_ {
        TokenType::Border => match key {
            "color" => "border-color".to_string(),
            "width" => "border-width".to_string(),
            "style" => "border-style".to_string(),
            _ => kebab(key),
        },
        TokenType::Typography => match key {
            "textCase" => "text-transform".to_string(),
            _ => kebab(key),
        },
        _ => kebab(key),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenValue {
    Single(Expression),
    Dict(IndexMap<String, Expression>),
}

/// The stylesheet variable name of a token path, without the `$` marker.
pub fn variable_name(path: &[String]) -> String {
    kebab(&path.iter().map(|segment| slugify(segment)).collect::<Vec<_>>().join(" "))
}

fn kebab(s: &str) -> String {
    s.with_boundaries(&[
        Boundary::Space,
        Boundary::Hyphen,
        Boundary::Underscore,
        Boundary::LowerUpper,
    ])
    .to_case(Case::Kebab)
}

pub(crate) fn slugify(s: &str) -> String {
    deunicode::deunicode(
        &s.replace(',', "c")
            .replace('+', "p")
            .replace('.', "d")
            .replace('(', " ")
            .replace(')', " "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(value: serde_json::Value) -> DesignTokens {
        DesignTokens::from_json(value, Path::new("test.json")).unwrap()
    }

    fn names_and_values(vars: &[FlatVariable]) -> Vec<(&str, &str)> {
        vars.iter()
            .map(|var| (var.name.as_str(), var.value.as_str()))
            .collect()
    }

    #[test]
    fn resolves_references_through_groups() {
        let tokens = tokens(json!({
            "colors": { "white": { "value": "#FFFFFF", "type": "color" } },
            "button": {
                "color": {
                    "background": { "value": "{colors.white}", "type": "color" },
                    "borderWidth": { "$value": 2, "$type": "dimension" }
                }
            }
        }));
        let vars = tokens
            .flatten(&TokenFilter {
                component: Some("button"),
                theme: None,
            })
            .unwrap();
        assert_eq!(
            names_and_values(&vars),
            vec![
                ("button-color-background", "#ffffff"),
                ("button-color-border-width", "2"),
            ]
        );
    }

    #[test]
    fn filters_tokens_by_mode() {
        let tokens = tokens(json!({
            "card": {
                "surface": {
                    "value": "#000000",
                    "$extensions": { "mode": "dark" }
                },
                "radius": { "value": "8px" }
            }
        }));
        let light = tokens
            .flatten(&TokenFilter {
                component: Some("card"),
                theme: Some("light"),
            })
            .unwrap();
        assert_eq!(names_and_values(&light), vec![("card-radius", "8px")]);
        let dark = tokens
            .flatten(&TokenFilter {
                component: Some("card"),
                theme: Some("dark"),
            })
            .unwrap();
        assert_eq!(dark.len(), 2);
    }

    #[test]
    fn expands_composite_values() {
        let tokens = tokens(json!({
            "heading": {
                "value": { "fontSize": "{size.lg}", "textCase": "uppercase" },
                "type": "typography"
            },
            "size": { "lg": { "value": "{size.base} * 2" }, "base": { "value": "12px" } }
        }));
        let vars = tokens
            .flatten(&TokenFilter {
                component: Some("heading"),
                theme: None,
            })
            .unwrap();
        assert_eq!(
            names_and_values(&vars),
            vec![
                ("heading-font-size", "24px"),
                ("heading-text-transform", "uppercase"),
            ]
        );
    }

    #[test]
    fn reports_unknown_and_circular_references() {
        let tokens = tokens(json!({
            "a": { "value": "{b}" },
            "b": { "value": "{a}" },
            "c": { "value": "{missing.token}" }
        }));
        let filter = |component| TokenFilter {
            component: Some(component),
            theme: None,
        };
        assert!(matches!(
            tokens.flatten(&filter("a")),
            Err(Error::CircularReference(_))
        ));
        assert!(matches!(
            tokens.flatten(&filter("c")),
            Err(Error::UnresolvedReference(path)) if path == "missing.token"
        ));
    }

    #[test]
    fn darken_modifier_lowers_lightness() {
        let tokens = tokens(json!({
            "base": { "value": "#ff0000", "type": "color" },
            "muted": {
                "value": "{base}",
                "type": "color",
                "$extensions": {
                    "studio.tokens": { "modify": { "type": "darken", "value": "0.5", "space": "hsl" } }
                }
            }
        }));
        let vars = tokens
            .flatten(&TokenFilter {
                component: Some("muted"),
                theme: None,
            })
            .unwrap();
        let color = csscolorparser::parse(&vars[0].value).unwrap();
        let (_, _, lightness, _) = color.to_hsla();
        assert!((lightness - 0.25).abs() < 0.01, "lightness {lightness}");
    }

    #[test]
    fn group_metadata_is_ignored() {
        let tokens = tokens(json!({
            "spacing": {
                "$type": "dimension",
                "$description": "Spacing scale",
                "sm": { "$value": "4px" }
            }
        }));
        let vars = tokens.flatten(&TokenFilter::default()).unwrap();
        assert_eq!(names_and_values(&vars), vec![("spacing-sm", "4px")]);
    }

    #[test]
    fn later_sources_override_earlier_ones() {
        let mut merged = json!({ "colors": { "bg": { "value": "#fff" }, "fg": { "value": "#000" } } });
        merge_json(&mut merged, json!({ "colors": { "bg": { "value": "#111" } } }));
        assert_eq!(
            merged,
            json!({ "colors": { "bg": { "value": "#111" }, "fg": { "value": "#000" } } })
        );
    }

    #[test]
    fn variable_names_are_kebab_case() {
        let path = |segments: &[&str]| segments.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(
            variable_name(&path(&["iconButton", "color", "Primary"])),
            "icon-button-color-primary"
        );
        assert_eq!(variable_name(&path(&["icon-button", "size"])), "icon-button-size");
        assert_eq!(variable_name(&path(&["Größe"])), "grosse");
    }

    #[test]
    fn es_module_keeps_filtered_tree() {
        let tokens = tokens(json!({
            "chip": { "gap": { "value": "4px" } },
            "other": { "gap": { "value": "2px", "type": "spacing" } }
        }));
        let module = tokens
            .to_es_module(&TokenFilter {
                component: Some("chip"),
                theme: None,
            })
            .unwrap();
        assert_eq!(
            module,
            r#"export const tokens = {
  "chip": {
    "gap": {
      "value": "4px",
      "name": "chip-gap",
      "path": [
        "chip",
        "gap"
      ]
    }
  }
} as const;
"#
        );
    }
}
