use std::sync::Arc;

use minijinja::{path_loader, Environment};
use minijinja::value::Value;
use serde::Serialize;

use crate::error::Result;
use crate::fstree::{EntryId, FsTree};
use crate::templating::{Defaults, Engine, EngineInit};

#[derive(Debug)]
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl EngineInit for MiniJinjaEngine {
    type Engine = Self;

    fn init<G: Serialize>(
        tree: Arc<FsTree>,
        root: Option<EntryId>,
        defaults: Defaults,
        globals: G,
    ) -> Result<Self::Engine> {
        let mut env = Environment::new();
        let overrides = root.map(|root| path_loader(&*tree[root].path));
        env.set_loader(move |name| {
            if let Some(source) = overrides.as_ref().map(|load| load(name)).transpose()?.flatten() {
                return Ok(Some(source));
            }

            Ok(defaults.iter().find(|(n, _)| *n == name).map(|(_, s)| s.to_string()))
        });

        env.add_global("G", Value::from_serialize(&globals));
        env.add_function("now", ext::now);
        env.add_filter("url", ext::url);
        env.add_filter("encode", ext::encode);
        env.add_filter("date", ext::date);
        env.add_filter("slugify", ext::slugify);
        Ok(MiniJinjaEngine { env })
    }
}

impl Engine for MiniJinjaEngine {
    fn render(&self, name: &str, context: &serde_json::Value) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }

    fn render_str(&self, name: &str, source: &str, context: &serde_json::Value) -> Result<String> {
        Ok(self.env.render_named_str(name, source, context)?)
    }
}

mod ext {
    use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
    use minijinja::{value::Value, Error, ErrorKind, State};

    fn base_path(state: &State<'_, '_>) -> String {
        state.lookup("G")
            .and_then(|g| g.get_attr("base_path").ok())
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default()
    }

    /// `{{ "/resources/" | url }}`: joins a site-local URL under `G.base_path`.
    pub fn url(state: &State<'_, '_>, value: &str) -> Value {
        let url = crate::url::with_base_path(&base_path(state), value);
        Value::from_safe_string(crate::util::escape_html(&url))
    }

    pub fn encode(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    pub fn slugify(value: &str) -> String {
        crate::util::slugify(value)
    }

    pub fn date(value: Value, fmt: Option<&str>) -> Result<Value, Error> {
        let fmt = fmt.unwrap_or("%Y-%m-%d");
        if let Ok(ts) = i64::try_from(value.clone()) {
            let datetime = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| Error::new(
                    ErrorKind::InvalidOperation,
                    "invalid timestamp provided to `date`"
                ))?;

            return Ok(datetime.format(fmt).to_string().into());
        }

        let kind = value.kind();
        let string = value.as_str()
            .ok_or_else(|| Error::new(
                ErrorKind::InvalidOperation,
                format!("`date` must be applied to a string or integer, found {kind}")
            ))?;

        let formatted = string.parse::<NaiveDate>().map(|d| d.format(fmt))
            .or_else(|_| string.parse::<NaiveDateTime>().map(|dt| dt.format(fmt)))
            .map_err(|e| Error::new(
                ErrorKind::InvalidOperation,
                format!("failed to parse {string}: {e}")
            ))?;

        Ok(formatted.to_string().into())
    }

    pub fn now(fmt: Option<&str>) -> String {
        Local::now().format(fmt.unwrap_or("%Y-%m-%d")).to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::MiniJinjaEngine;
    use crate::fstree::FsTree;
    use crate::templating::{Engine, EngineInit};

    const DEFAULTS: &[(&str, &str)] = &[
        ("page.html", "<a href=\"{{ href | url }}\">{{ G.title }}</a>"),
        ("other.html", "default other"),
    ];

    #[test]
    fn site_templates_override_defaults() {
        let dir = std::env::temp_dir().join(format!("guidebook-tmpl-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("templates")).unwrap();
        std::fs::write(dir.join("templates/other.html"), "custom {{ name | slugify }}").unwrap();

        let tree = Arc::new(FsTree::build(&dir).unwrap());
        let root = tree.get_dir(None, "templates").map(|e| e.id);
        let globals = json!({ "title": "华东导游词", "base_path": "/GuideWords.github.io" });
        let engine = MiniJinjaEngine::init(tree, root, DEFAULTS, globals).unwrap();

        let page = engine.render("page.html", &json!({ "href": "/resources/" })).unwrap();
        assert_eq!(page, "<a href=\"/GuideWords.github.io/resources/\">华东导游词</a>");

        let other = engine.render("other.html", &json!({ "name": "Su Shi" })).unwrap();
        assert_eq!(other, "custom su-shi");

        assert!(engine.render("missing.html", &json!({})).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn filters_format_and_encode() {
        let dir = std::env::temp_dir().join(format!("guidebook-tmpl-bare-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let tree = Arc::new(FsTree::build(&dir).unwrap());
        let engine = MiniJinjaEngine::init(tree, None, DEFAULTS, json!({})).unwrap();

        let out = engine.render_str("t", "{{ d | date('%Y/%m') }} {{ f | encode }}", &json!({
            "d": "2025-03-01",
            "f": "a b/c",
        })).unwrap();

        assert_eq!(out, "2025/03 a%20b%2Fc");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
