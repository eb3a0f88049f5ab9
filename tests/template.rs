//! `{{ }}` token expansion against real files.

use std::fs;
use std::path::Path;

use indoc::indoc;
use saphyr_wire::{
    from_str, load_with_templates, EnvVar, Error, FileTokens, Node, Options, RelativePath,
    TemplateVisitor, Visitor,
};

fn write(dir: &Path, name: &str, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = dir.join(name).parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dir.join(name), text)?;
    Ok(())
}

#[test]
fn relative_token_becomes_an_absolute_path() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "conf/main.yml", "data: '{{ relative: ../data/train.csv }}'\n")?;

    let tree = load_with_templates(dir.path().join("conf/main.yml"), &Options::default())?;
    let data = tree.get("data").and_then(Node::as_str).unwrap_or_default();
    assert_eq!(Path::new(data), dir.path().join("data/train.csv"));
    Ok(())
}

#[test]
fn env_token_reads_the_environment() -> anyhow::Result<()> {
    let mut visitor = TemplateVisitor::new(EnvVar);
    let input = from_str("path: '{{ env: PATH }}'\nmissing: '{{ env: SAPHYR_WIRE_SURELY_UNSET }}'\n")?;
    let output = visitor.visit(&input)?;
    let expected = std::env::var("PATH")?;
    assert_eq!(output.get("path").and_then(Node::as_str), Some(expected.as_str()));
    // An unset variable leaves the token in place.
    assert_eq!(
        output.get("missing").and_then(Node::as_str),
        Some("{{ env: SAPHYR_WIRE_SURELY_UNSET }}")
    );
    Ok(())
}

#[test]
fn document_tokens_load_recursively() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "main.yml", "model: '{{ parts/model.yml }}'\n")?;
    write(
        dir.path(),
        "parts/model.yml",
        indoc! {"
            encoder: '{{ encoder.yml }}'
            weights: '{{ relative: weights.bin }}'
        "},
    )?;
    write(dir.path(), "parts/encoder.yml", "layers: [64, 32]\n")?;

    let tree = load_with_templates(dir.path().join("main.yml"), &Options::default())?;
    let model = tree.get("model").unwrap();
    assert_eq!(model.get("encoder").unwrap().to_string(), "{layers: [64, 32]}");
    let weights = model.get("weights").and_then(Node::as_str).unwrap_or_default();
    assert_eq!(Path::new(weights), dir.path().join("parts/weights.bin"));
    Ok(())
}

#[test]
fn unresolvable_tokens_are_kept() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "main.yml", "a: '{{ nowhere.yml }}'\nb: 'not {{ a token }}'\n")?;

    let tree = load_with_templates(dir.path().join("main.yml"), &Options::default())?;
    assert_eq!(tree.get("a").and_then(Node::as_str), Some("{{ nowhere.yml }}"));
    assert_eq!(tree.get("b").and_then(Node::as_str), Some("not {{ a token }}"));
    Ok(())
}

#[test]
fn self_including_documents_stop_at_the_depth_limit() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "loop.yml", "again: '{{ loop.yml }}'\n")?;

    let tree = load_with_templates(dir.path().join("loop.yml"), &Options::default())?;
    let mut depth = 0;
    let mut node = &tree;
    while let Some(next) = node.get("again") {
        depth += 1;
        node = next;
    }
    assert_eq!(depth, saphyr_wire::template::MAX_INCLUDE_DEPTH + 1);
    assert_eq!(node.as_str(), Some("{{ loop.yml }}"));
    Ok(())
}

#[test]
fn resolvers_combine_in_order() -> anyhow::Result<()> {
    let fallback = |token: &str| -> Result<Node, Error> { Ok(Node::from(token.to_uppercase())) };
    let mut visitor = TemplateVisitor::new((RelativePath::new("/etc/app/conf.yml"), fallback));
    let input = from_str("a: '{{ relative: x.yml }}'\nb: '{{ name }}'\nc: 3\n")?;
    let output = visitor.visit(&input)?;
    assert_eq!(output.to_string(), "{a: /etc/app/x.yml, b: NAME, c: 3}");
    Ok(())
}

#[test]
fn file_tokens_expose_the_current_file() {
    let tokens = FileTokens::new("/srv/conf/main.yml", Options::default());
    assert_eq!(tokens.file(), Path::new("/srv/conf/main.yml"));
}
