//! A reduced `str.format`-style spec mini-language: fill/align, width, and precision.
//!
//! Full Python format-spec grammar (sign, `#`, `,`, presentation types) has no equivalent on our
//! tagged [`Value`] and is out of scope; this covers what the original's placeholders actually
//! use in practice — truncating a UUID with `{id!s:.8}`, padding a column to a fixed width.

use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone)]
pub struct FormatSpec {
    fill: char,
    align: Option<Align>,
    width: Option<usize>,
    precision: Option<usize>,
}

impl FormatSpec {
    pub fn parse(spec: &str) -> Result<Self, String> {
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        let mut fill = ' ';
        let mut align = None;

        if chars.len() >= 2 && matches!(chars[1], '<' | '>' | '^') {
            fill = chars[0];
            align = Some(match chars[1] {
                '<' => Align::Left,
                '>' => Align::Right,
                _ => Align::Center,
            });
            i = 2;
        } else if !chars.is_empty() && matches!(chars[0], '<' | '>' | '^') {
            align = Some(match chars[0] {
                '<' => Align::Left,
                '>' => Align::Right,
                _ => Align::Center,
            });
            i = 1;
        }

        let width_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        let width = if i > width_start {
            Some(chars[width_start..i].iter().collect::<String>().parse().map_err(|_| spec.to_string())?)
        } else {
            None
        };

        let precision = if chars.get(i) == Some(&'.') {
            i += 1;
            let prec_start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i == prec_start {
                return Err(format!("missing precision digits in '{spec}'"));
            }
            Some(chars[prec_start..i].iter().collect::<String>().parse().map_err(|_| spec.to_string())?)
        } else {
            None
        };

        // Trailing presentation-type letters (e.g. `d`, `f`, `s`) are accepted and ignored: our
        // values are already rendered to their display form before a spec is ever applied.
        Ok(Self { fill, align, width, precision })
    }

    fn apply(&self, s: &str) -> String {
        let mut out = match self.precision {
            Some(p) => s.chars().take(p).collect::<String>(),
            None => s.to_string(),
        };
        if let Some(width) = self.width {
            let len = out.chars().count();
            if len < width {
                let pad = width - len;
                let align = self.align.unwrap_or(Align::Left);
                out = match align {
                    Align::Left => out + &self.fill.to_string().repeat(pad),
                    Align::Right => self.fill.to_string().repeat(pad) + &out,
                    Align::Center => {
                        let left = pad / 2;
                        let right = pad - left;
                        format!("{}{out}{}", self.fill.to_string().repeat(left), self.fill.to_string().repeat(right))
                    }
                };
            }
        }
        out
    }
}

/// Renders one placeholder value, applying an optional `!conv` conversion then an optional
/// `:spec` formatting pass.
pub fn render_value(value: &Value, conversion: Option<char>, spec: Option<&FormatSpec>) -> String {
    let s = match conversion {
        Some('r') => match value {
            Value::Str(s) => format!("{s:?}"),
            other => other.display(),
        },
        _ => value.display(),
    };
    match spec {
        Some(spec) => spec.apply(&s),
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precision_truncates_like_a_uuid_prefix() {
        let spec = FormatSpec::parse(".8").unwrap();
        let value = Value::Str("550e8400-e29b-41d4-a716-446655440000".to_string());
        assert_eq!(render_value(&value, None, Some(&spec)), "550e8400");
    }

    #[test]
    fn width_pads_with_default_left_align() {
        let spec = FormatSpec::parse("5").unwrap();
        assert_eq!(render_value(&Value::Int(7), None, Some(&spec)), "7    ");
    }

    #[test]
    fn explicit_right_align_with_fill_char() {
        let spec = FormatSpec::parse("0>5").unwrap();
        assert_eq!(render_value(&Value::Int(7), None, Some(&spec)), "00007");
    }

    #[test]
    fn repr_conversion_quotes_strings() {
        let value = Value::Str("hi".to_string());
        assert_eq!(render_value(&value, Some('r'), None), "\"hi\"");
    }
}
