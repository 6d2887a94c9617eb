use serde::de::DeserializeOwned;

use crate::error::{ErrorDetail, Result, Chainable};
use crate::data::Source;

/// A structured text format that deserializes into any `T`.
pub trait Format {
    type Error: ErrorDetail + 'static;

    /// Name used in error messages.
    const NAME: &'static str;

    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    /// Reads `input` as text and deserializes it as `T`.
    fn read<I: Source, T: DeserializeOwned>(input: I) -> Result<T> {
        let path = input.path().map(|p| p.display().to_string());
        let text = input.read_text()?;
        Self::from_str(&text).chain_with(|| error! {
            format!("{} deserialization failed", Self::NAME),
            "file path" => path.as_deref().unwrap_or("<memory>"),
        })
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            const NAME: &'static str = stringify!($name);

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Toml: toml::from_str, toml::de::Error);
impl_format!(Json: serde_json::from_str, serde_json::Error);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Row { id: String, rank: u8 }

    #[test]
    fn toml_and_json_agree() {
        let t: Row = Toml::read("id = \"leifengta\"\nrank = 2").unwrap();
        let j: Row = Json::read(r#"{"id": "leifengta", "rank": 2}"#).unwrap();
        assert_eq!(t, j);
    }

    #[test]
    fn failure_names_the_format() {
        let e = Json::read::<_, Row>("{").unwrap_err();
        assert_eq!(e.message(), "Json deserialization failed");
    }
}
