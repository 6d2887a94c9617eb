use std::borrow::Cow;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::data::{Format, Sink};
use crate::error::{Chainable, Result};
use crate::markdown::Plugin;

/// Strips a `+++`-fenced front matter block, parses it with `F` as a `T`, and
/// writes the result to `output`. Sources without front matter are left
/// untouched and nothing is written.
pub struct FrontMatter<T, F, O> {
    output: O,
    _marker: PhantomData<fn() -> (T, F)>,
}

impl<T, F, O> FrontMatter<T, F, O>
    where T: DeserializeOwned, F: Format, O: Sink<T>
{
    pub fn new(_format: F, output: O) -> Self {
        FrontMatter { output, _marker: PhantomData }
    }
}

const FENCE: &str = "+++";

fn split(input: &str) -> Option<(&str, &str)> {
    let rest = input.strip_prefix('\u{feff}').unwrap_or(input);
    let rest = rest.strip_prefix(FENCE)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }

        offset += line.len();
    }

    None
}

impl<T, F, O> Plugin for FrontMatter<T, F, O>
    where T: DeserializeOwned, F: Format, O: Sink<T>
{
    fn preprocess<'a>(&self, input: &'a str) -> Result<Cow<'a, str>> {
        let Some((front_matter, content)) = split(input) else {
            return Ok(Cow::Borrowed(input));
        };

        let value = F::from_str::<T>(front_matter).chain(error!("invalid front matter"))?;
        self.output.write(value)?;
        Ok(Cow::Borrowed(content))
    }
}

#[cfg(test)]
mod tests {
    use once_cell::unsync::OnceCell;

    use crate::data::Toml;
    use crate::markdown::*;

    #[derive(serde::Deserialize, Debug)]
    struct Meta { title: String }

    #[test]
    fn front_matter_is_parsed_and_stripped() {
        let (meta, html) = (OnceCell::<Meta>::new(), OnceCell::<String>::new());
        Markdown::from("+++\ntitle = \"狮子林\"\n+++\nbody text\n")
            .plugin(FrontMatter::new(Toml, &meta))
            .plugin(Renderer::new(&html))
            .run()
            .unwrap();

        assert_eq!(meta.get().unwrap().title, "狮子林");
        assert_eq!(html.get().unwrap(), "<p>body text</p>\n");
    }

    #[test]
    fn unterminated_front_matter_is_content() {
        let (meta, html) = (OnceCell::<Meta>::new(), OnceCell::<String>::new());
        Markdown::from("+++\ntitle = 1\n")
            .plugin(FrontMatter::new(Toml, &meta))
            .plugin(Renderer::new(&html))
            .run()
            .unwrap();

        assert!(meta.get().is_none());
        assert!(html.get().unwrap().contains("title = 1"));
    }

    #[test]
    fn malformed_front_matter_errors() {
        let meta = OnceCell::<Meta>::new();
        let result = Markdown::from("+++\ntitle = \n+++\nx")
            .plugin(FrontMatter::new(Toml, &meta))
            .run();

        assert!(result.is_err());
    }
}
