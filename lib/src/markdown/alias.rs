use pulldown_cmark::{Event, Tag, CowStr};
use rustc_hash::FxHashMap;

use crate::markdown::{Events, Plugin};

pub type AliasMap = FxHashMap<String, String>;

/// Rewrites `@name/rest` link and image destinations to `prefix/rest`, where
/// `prefix` is the value of `name` in the alias map. `@/rest` uses the empty
/// alias, conventionally the site root. Unknown aliases are left unchanged.
#[derive(Clone)]
pub struct Alias<'m> {
    map: &'m AliasMap,
}

impl<'m> Alias<'m> {
    pub fn new(map: &'m AliasMap) -> Self { Self { map } }
}

impl Plugin for Alias<'_> {
    fn remap<'a>(&'a mut self, events: Events<'a>) -> Events<'a> {
        let map: &'a AliasMap = self.map;
        Box::new(events.map(move |event| match event {
            Event::Start(Tag::Link { link_type, dest_url, title, id }) => {
                let dest_url = rewrite(map, dest_url);
                Event::Start(Tag::Link { link_type, dest_url, title, id })
            }
            Event::Start(Tag::Image { link_type, dest_url, title, id }) => {
                let dest_url = rewrite(map, dest_url);
                Event::Start(Tag::Image { link_type, dest_url, title, id })
            }
            event => event,
        }))
    }
}

/// ```rust
/// use guidebook::markdown::{rewrite, AliasMap};
///
/// let mut map = AliasMap::default();
/// map.insert("".into(), "/GuideWords.github.io".into());
/// map.insert("pdfs".into(), "/GuideWords.github.io/pdfs/".into());
///
/// assert_eq!(&*rewrite(&map, "@/resources/".into()), "/GuideWords.github.io/resources/");
/// assert_eq!(&*rewrite(&map, "@pdfs/a.pdf".into()), "/GuideWords.github.io/pdfs/a.pdf");
/// assert_eq!(&*rewrite(&map, "@nope/x".into()), "@nope/x");
/// assert_eq!(&*rewrite(&map, "https://a.org".into()), "https://a.org");
/// ```
pub fn rewrite<'a>(aliases: &AliasMap, href: CowStr<'a>) -> CowStr<'a> {
    let Some(rest) = href.strip_prefix('@') else {
        return href;
    };

    let (alias, suffix) = rest.split_once('/').unwrap_or((rest, ""));
    let Some(prefix) = aliases.get(alias) else {
        return href;
    };

    let mut url = crate::url::UrlBuf::from(prefix.as_str());
    url.append(suffix);
    if href.ends_with('/') {
        url.make_directory();
    }

    String::from(url).into()
}
