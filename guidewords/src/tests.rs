use std::fs;
use std::path::Path;

use guidebook::Renderer;
use guidebook::templating::minijinja::MiniJinjaEngine;

use crate::discover::Guidewords;

fn tempdir() -> tempfile::TempDir {
    tempfile::Builder::new().prefix("guidewords-").tempdir().unwrap()
}

fn write(root: &Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture(root: &Path) {
    write(root, "config.toml", r#"
        title = "华东导游词"
        author = "谁人不识张公子"
        base_path = "/GuideWords.github.io"
        base_url = "https://holding-hands.github.io"
        protect = true

        [labels]
        all = "全部"
        other = "其他"
    "#);

    write(root, "guides.toml", r#"
        [[guide]]
        id = "leifengta"
        file = "杭州景点/雷峰塔.md"
        title = "雷峰塔"
        category = "杭州景点"
        location = "杭州西湖"

        [[guide]]
        id = "zhuozhengyuan"
        file = "苏州园林/拙政园.md"
        category = "苏州园林"

        [[guide]]
        id = "missing"
        file = "nowhere.md"
        title = "不存在"
        category = "杭州景点"
    "#);

    write(root, "content/杭州景点/雷峰塔.md", "# 雷峰塔\n\n## 历史\n\n雷峰塔位于西湖南岸夕照山。\n");
    write(root, "content/苏州园林/拙政园.md", "+++\ntitle = \"拙政园\"\ndescription = \"江南园林的代表\"\n+++\n\n拙政园始建于明代。\n");

    write(root, "resources.toml", r#"
        [[resource]]
        id = "huxueyan-restoration"
        title = "胡雪岩故居修复研究"
        description = "故居修复报告"
        fileSize = "163 MB"
        category = "古建筑"
        subCategory = "修复"
        pdfUrl = "/pdfs/huxueyan.pdf"

        [[resource]]
        id = "notes"
        title = "讲解笔记"
        description = "讲解要点"
        fileSize = "12 KB"
        category = "古建筑"
        pdfUrl = "/pdfs/notes.md"

        [[resource]]
        id = "lingyin-notes"
        title = "灵隐寺讲解稿"
        description = "外部托管的讲解稿"
        fileSize = "20 KB"
        category = "寺庙"
        pdfUrl = "https://example.com/lingyin.md"
    "#);

    write(root, "assets/pdfs/huxueyan.pdf", "%PDF-1.4");
    write(root, "assets/pdfs/notes.md", "# 讲解笔记\n\n先看门楼。\n");
}

/// The JSON in a page's `data-plan` attribute.
fn plan_of(html: &str) -> serde_json::Value {
    let start = html.find("data-plan=\"").unwrap() + "data-plan=\"".len();
    let end = start + html[start..].find('"').unwrap();
    let json = html[start..end]
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#x2f;", "/")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    serde_json::from_str(&json).unwrap()
}

#[test]
fn builds_a_small_site() {
    let input = tempdir();
    let output = tempdir();
    fixture(input.path());

    let guidewords = Guidewords::new::<MiniJinjaEngine, _, _>(input.path(), output.path()).unwrap();
    let site = guidewords.discover().unwrap();
    assert_eq!(site.guides.len(), 3);
    assert_eq!(site.resources.len(), 3);

    let rendered = guidewords.render_site(&site).unwrap();
    assert_eq!(rendered.len(), site.pages().len());

    let out = output.path();
    let read = |path: &str| fs::read_to_string(out.join(path)).unwrap();

    let home = read("index.html");
    assert!(home.contains("href=\"/GuideWords.github.io/guides/leifengta/\""));
    assert!(home.contains("watermark-pattern"));

    let guide = read("guides/leifengta/index.html");
    assert!(guide.contains("雷峰塔位于西湖南岸夕照山"));
    assert!(guide.contains("href=\"#li-shi\""));

    let garden = &site.guides[1];
    assert_eq!(garden.title, "拙政园");
    assert_eq!(garden.description.as_deref(), Some("江南园林的代表"));

    let missing = read("guides/missing/index.html");
    assert!(missing.contains("file nowhere.md not found"));

    let viewer = read("resources/huxueyan-restoration/index.html");
    assert!(viewer.contains("data-choice=\"continue_inline\""));
    assert!(viewer.contains("163 MB"));
    let plan = plan_of(&viewer);
    assert_eq!(plan["open"], "prompt");
    assert_eq!(plan["choices"]["download_instead"], "download");
    assert_eq!(plan["desktop"][0]["url"], "/GuideWords.github.io/pdfs/huxueyan.pdf");
    assert_eq!(plan["desktop"][1]["target"], "https://holding-hands.github.io/GuideWords.github.io/pdfs/huxueyan.pdf");
    assert_eq!(plan["mobile"].as_array().unwrap().len(), 1);

    let external = read("resources/lingyin-notes/index.html");
    assert!(external.contains("class=\"viewer-document content\" hidden"));
    assert!(external.contains("class=\"viewer-retry\""));
    assert!(!external.contains("<iframe"));
    let plan = plan_of(&external);
    assert_eq!(plan["format"], "markdown");
    assert_eq!(plan["download_url"], "https://example.com/lingyin.md");

    let notes = read("resources/notes/index.html");
    assert!(notes.contains("先看门楼"));

    let grouped = read("resources/c/gu-jian-zhu/index.html");
    assert!(grouped.contains("其他"));

    assert_eq!(fs::read(out.join("pdfs/huxueyan.pdf")).unwrap(), b"%PDF-1.4");
    let script = read("_static/site.js");
    assert!(script.starts_with("var GUIDEBOOK = {"));
    assert!(script.contains("addEventListener('copy', stop)"));

    let sitemap = read("sitemap.xml");
    assert!(sitemap.contains("<loc>https://holding-hands.github.io/GuideWords.github.io/resources/huxueyan-restoration/</loc>"));

    let data: serde_json::Value = serde_json::from_str(&read("data/resources.json")).unwrap();
    assert_eq!(data[0]["fileSize"], "163 MB");
}

#[test]
fn template_overrides_win() {
    let input = tempdir();
    let output = tempdir();
    fixture(input.path());
    write(input.path(), "templates/debug.html", "debug {{ build.guides }}");

    let guidewords = Guidewords::new::<MiniJinjaEngine, _, _>(input.path(), output.path()).unwrap();
    let site = guidewords.discover().unwrap();
    guidewords.render_site(&site).unwrap();
    assert_eq!(fs::read_to_string(output.path().join("debug/index.html")).unwrap(), "debug 3");
}

#[test]
fn viewer_proxies_wait_for_the_page_without_a_public_url() {
    let input = tempdir();
    let output = tempdir();
    fixture(input.path());
    write(input.path(), "config.toml", "title = \"x\"\n");

    let guidewords = Guidewords::new::<MiniJinjaEngine, _, _>(input.path(), output.path()).unwrap();
    let site = guidewords.discover().unwrap();
    guidewords.render_site(&site).unwrap();

    let viewer = fs::read_to_string(output.path().join("resources/huxueyan-restoration/index.html")).unwrap();
    let mobile = &plan_of(&viewer)["mobile"][0];
    assert_eq!(mobile["kind"], "proxy");
    assert_eq!(mobile["target"], "/pdfs/huxueyan.pdf");
    assert_eq!(mobile["viewer"], guidebook::viewer::PDF_VIEWER);
}

#[test]
fn similar_categories_are_exported_separately() {
    let input = tempdir();
    let output = tempdir();
    fixture(input.path());
    write(input.path(), "guides.toml", r#"
        [[guide]]
        id = "a"
        file = "杭州景点/雷峰塔.md"
        category = "苏州"

        [[guide]]
        id = "b"
        file = "杭州景点/雷峰塔.md"
        category = "蘇州"
    "#);

    let guidewords = Guidewords::new::<MiniJinjaEngine, _, _>(input.path(), output.path()).unwrap();
    let site = guidewords.discover().unwrap();
    guidewords.render_site(&site).unwrap();

    let read = |path: &str| fs::read_to_string(output.path().join(path)).unwrap();
    let first = read("category/su-zhou/index.html");
    let second = read("category/su-zhou-2/index.html");
    assert!(first.contains("href=\"/GuideWords.github.io/category/su-zhou-2/\""));
    assert_ne!(first, second);
}

#[test]
fn demo_site_resources_point_at_exported_files() {
    let input = Path::new(env!("CARGO_MANIFEST_DIR")).join("../site");
    let output = tempdir();

    let guidewords = Guidewords::new::<MiniJinjaEngine, _, _>(&input, output.path()).unwrap();
    let site = guidewords.discover().unwrap();
    guidewords.render_site(&site).unwrap();

    let local: Vec<_> = site.resources.iter()
        .map(|r| r.document_url())
        .filter(|url| !guidebook::url::is_external(url))
        .collect();

    assert!(!local.is_empty());
    for url in local {
        assert!(!url.starts_with("/resources/"), "{url} is inside the resource pages");
        assert!(output.path().join(url.trim_start_matches('/')).is_file(), "{url} was not exported");
    }
}
