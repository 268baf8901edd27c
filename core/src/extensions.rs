use csscolorparser::Color;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    expression::{Expression, Value},
    DesignTokens,
};

/// The `$extensions` block of a token.
#[derive(Debug, Default, Deserialize)]
pub struct Extensions {
    /// Theme the token is restricted to. Absent means every theme.
    pub mode: Option<String>,
    #[serde(rename = "studio.tokens")]
    pub studio_tokens: Option<StudioTokensExtension>,
}
impl Extensions {
    pub fn applies_to(&self, theme: &str) -> bool {
        self.mode.as_deref().map_or(true, |mode| mode == theme)
    }
}

#[derive(Debug, Deserialize)]
pub enum StudioTokensModify {
    #[serde(rename = "lighten")]
    Lighten,
    #[serde(rename = "darken")]
    Darken,
    #[serde(rename = "alpha")]
    Alpha,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub enum StudioTokensSpace {
    #[serde(rename = "hsl")]
    Hsl,
    #[serde(rename = "lch")]
    Lch,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct StudioTokensExtension {
    pub modify: Option<StudioTokensModifier>,
}

#[derive(Debug, Deserialize)]
pub struct StudioTokensModifier {
    #[serde(rename = "type")]
    pub type_: StudioTokensModify,
    pub value: Expression,
    pub space: StudioTokensSpace,
}
impl StudioTokensModifier {
    /// Applies the modifier to the already resolved `base_value` of the
    /// token at `path`.
    pub fn apply(
        &self,
        path: &str,
        base_value: Value,
        tokens: &DesignTokens,
        stack: &mut Vec<String>,
    ) -> Result<Value> {
        let invalid = |reason: String| Error::InvalidModifier {
            path: path.to_string(),
            reason,
        };
        let amount = match self.value.get_value(tokens, stack)?.as_number() {
            Some((amount, "")) => amount,
            _ => return Err(invalid("amount is not a plain number".to_string())),
        };
        let color = match base_value {
            Value::Color(color) => color,
            other => return Err(invalid(format!("'{}' is not a color", other.to_css()))),
        };
        let modified = match (&self.space, &self.type_) {
            (StudioTokensSpace::Hsl, StudioTokensModify::Lighten) => {
                let (h, s, l, a) = color.to_hsla();
                Color::from_hsla(h, s, (l + l * amount).clamp(0.0, 1.0), a)
            }
            (StudioTokensSpace::Hsl, StudioTokensModify::Darken) => {
                let (h, s, l, a) = color.to_hsla();
                Color::from_hsla(h, s, (l - l * amount).clamp(0.0, 1.0), a)
            }
            (StudioTokensSpace::Lch, StudioTokensModify::Alpha) => {
                let (l, c, h, a) = color.to_lch();
                Color::from_lch(l, c, h, (a + a * amount).clamp(0.0, 1.0))
            }
            (space, type_) => {
                return Err(invalid(format!(
                    "unsupported combination {type_:?} in {space:?}"
                )))
            }
        };
        Ok(Value::Color(modified))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use rstest::rstest;
    use serde_json::json;

    use crate::{error::Error, DesignTokens, TokenFilter};

    fn modified(base: &str, type_: &str, amount: &str, space: &str) -> crate::Result<String> {
        let tokens = DesignTokens::from_json(
            json!({
                "base": { "value": base },
                "modified": {
                    "value": "{base}",
                    "$extensions": {
                        "studio.tokens": {
                            "modify": { "type": type_, "value": amount, "space": space }
                        }
                    }
                }
            }),
            Path::new("test.json"),
        )?;
        let variables = tokens.flatten(&TokenFilter {
            component: Some("modified"),
            theme: None,
        })?;
        Ok(variables[0].value.clone())
    }

    #[rstest]
    #[case::lighten("#404040", "lighten", "0.5", "hsl", "#606060")]
    #[case::lighten_clamps("#ffffff", "lighten", "0.5", "hsl", "#ffffff")]
    #[case::darken("#808080", "darken", "0.5", "hsl", "#404040")]
    #[case::alpha("#ffffff", "alpha", "-0.5", "lch", "#ffffff80")]
    fn applies_modifier(
        #[case] base: &str,
        #[case] type_: &str,
        #[case] amount: &str,
        #[case] space: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(modified(base, type_, amount, space).unwrap(), expected);
    }

    #[rstest]
    #[case::unsupported_pair("#ffffff", "alpha", "0.5", "hsl", "unsupported combination")]
    #[case::unknown_space("#ffffff", "darken", "0.5", "srgb", "unsupported combination")]
    #[case::not_a_color("12px", "lighten", "0.5", "hsl", "'12px' is not a color")]
    #[case::amount_not_a_number("#ffffff", "darken", "half", "hsl", "not a plain number")]
    fn rejects_modifier(
        #[case] base: &str,
        #[case] type_: &str,
        #[case] amount: &str,
        #[case] space: &str,
        #[case] reason_part: &str,
    ) {
        match modified(base, type_, amount, space) {
            Err(Error::InvalidModifier { path, reason }) => {
                assert_eq!(path, "modified");
                assert!(reason.contains(reason_part), "{reason}");
            }
            other => panic!("expected an invalid modifier, got {other:?}"),
        }
    }
}
