//! TypeScript output for reconstructed component tokens.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{error::Result, reconstruct::ComponentTokens};

static BARE_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r": (#[a-fA-F0-9]+)").unwrap());

/// `icon-button` -> `iconButton`
pub fn camel_case(name: &str) -> String {
    let mut segments = name.split('-');
    let mut out = segments.next().unwrap_or_default().to_string();
    for segment in segments {
        out.push_str(&capitalize(segment));
    }
    out
}

/// `icon-button` -> `IconButton`
pub fn pascal_case(name: &str) -> String {
    capitalize(&camel_case(name))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Quotes hex colors that a serializer left as bare words.
pub fn quote_bare_colors(object_literal: &str) -> String {
    BARE_COLOR
        .replace_all(object_literal, r#": "${1}""#)
        .into_owned()
}

pub fn module_name(component: &str) -> String {
    format!("{component}.tokens")
}

/// Where a module came from and how to regenerate it; both end up in the
/// file header.
#[derive(Debug, Clone, Copy)]
pub struct ModuleHeader<'a> {
    pub source_label: &'a str,
    pub theme: &'a str,
    pub regenerate_command: &'a str,
}

pub fn render_module(tokens: &ComponentTokens, header: &ModuleHeader) -> Result<String> {
    let camel = camel_case(&tokens.name);
    let pascal = pascal_case(&tokens.name);
    let object = quote_bare_colors(&serde_json::to_string_pretty(&tokens.tree)?);
    Ok(format!(
        "/**
 * {pascal} Design Tokens
 * Auto-generated from {label}/{name}.{theme}.scss
 *
 * DO NOT EDIT MANUALLY - This file is auto-generated
 * Run: {command}
 */

export const {camel}Tokens = {object} as const;

export type {pascal}Tokens = typeof {camel}Tokens;
",
        label = header.source_label,
        name = tokens.name,
        theme = header.theme,
        command = header.regenerate_command,
    ))
}

pub fn render_index<S: AsRef<str>>(components: &[S]) -> String {
    let exports = components
        .iter()
        .map(|name| {
            let name = name.as_ref();
            let module = module_name(name);
            format!(
                "export {{ {}Tokens }} from \"./{module}\";\nexport type {{ {}Tokens }} from \"./{module}\";",
                camel_case(name),
                pascal_case(name),
            )
        })
        .join("\n");
    format!(
        "/**
 * Design Tokens Index
 * Auto-generated - DO NOT EDIT MANUALLY
 */

{exports}
"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_conventions() {
        assert_eq!(camel_case("button"), "button");
        assert_eq!(camel_case("icon-button"), "iconButton");
        assert_eq!(pascal_case("icon-button"), "IconButton");
        assert_eq!(pascal_case("avatar"), "Avatar");
    }

    #[test]
    fn quotes_only_bare_colors() {
        assert_eq!(
            quote_bare_colors("{\n  \"a\": #FFF,\n  \"b\": \"#000\"\n}"),
            "{\n  \"a\": \"#FFF\",\n  \"b\": \"#000\"\n}"
        );
    }

    #[test]
    fn renders_component_module() {
        let mut tokens = ComponentTokens::new("avatar");
        tokens.insert("$avatar-size", "40");
        tokens.insert("$avatar-size-small", "24");
        tokens.insert("$avatar-color-ring", "#ffffff");
        let module = render_module(
            &tokens,
            &ModuleHeader {
                source_label: "design-tokens/dist",
                theme: "light",
                regenerate_command: "pnpm generate:tokens",
            },
        )
        .unwrap();
        assert_eq!(
            module,
            r##"/**
 * Avatar Design Tokens
 * Auto-generated from design-tokens/dist/avatar.light.scss
 *
 * DO NOT EDIT MANUALLY - This file is auto-generated
 * Run: pnpm generate:tokens
 */

export const avatarTokens = {
  "size": {
    "_value": 40,
    "small": 24
  },
  "color": {
    "ring": "#ffffff"
  }
} as const;

export type AvatarTokens = typeof avatarTokens;
"##
        );
    }

    #[test]
    fn renders_index() {
        assert_eq!(
            render_index(&["avatar", "icon-button"]),
            r#"/**
 * Design Tokens Index
 * Auto-generated - DO NOT EDIT MANUALLY
 */

export { avatarTokens } from "./avatar.tokens";
export type { AvatarTokens } from "./avatar.tokens";
export { iconButtonTokens } from "./icon-button.tokens";
export type { IconButtonTokens } from "./icon-button.tokens";
"#
        );
    }
}
