use super::{print_results, print_summary, read_page, write_page};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pagewright_editor::{apply_batch, Batch, Operation};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// HTML page to edit
    pub page: PathBuf,

    /// JSON file holding an operation array or a batch object
    pub operations: PathBuf,

    /// Root selector operations are scoped to (overrides the batch's)
    #[arg(short, long)]
    pub root: Option<String>,

    /// Output file (defaults to overwriting the page)
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Print results without writing the page
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OperationsFile {
    Operations(Vec<Operation>),
    Batch(Batch),
}

impl OperationsFile {
    fn into_batch(self) -> Batch {
        match self {
            OperationsFile::Operations(operations) => Batch {
                operations,
                root_selector: None,
            },
            OperationsFile::Batch(batch) => batch,
        }
    }
}

pub(crate) fn read_batch(path: &Path) -> Result<Batch> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let file: OperationsFile =
        serde_json::from_str(&content).with_context(|| format!("Invalid operations in {}", path.display()))?;
    Ok(file.into_batch())
}

pub fn apply(args: ApplyArgs, _cwd: &str) -> Result<()> {
    let mut dom = read_page(&args.page)?;
    let batch = read_batch(&args.operations)?;
    let root = args.root.or(batch.root_selector);

    println!("{}", "🔧 Applying operations...".bright_blue().bold());
    let outcome = apply_batch(&mut dom, &batch.operations, root.as_deref());

    print_results(&outcome.results);
    println!();
    print_summary(&outcome.results);

    println!();
    println!("{}", "Inverse:".bright_white().bold());
    let inverse = Batch {
        operations: outcome.inverse,
        root_selector: root,
    };
    println!("{}", serde_json::to_string_pretty(&inverse)?);

    if !args.dry_run {
        let written = write_page(&dom, &args.page, args.out.as_ref())?;
        println!();
        println!("{} Wrote {}", "✓".green(), written.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operations_file_forms() {
        let dir = tempfile::tempdir().unwrap();

        let bare = dir.path().join("bare.json");
        fs::write(&bare, r#"[{"selector": "h1", "action": "remove"}]"#).unwrap();
        let batch = read_batch(&bare).unwrap();
        assert_eq!(batch.operations, vec![Operation::remove("h1")]);
        assert_eq!(batch.root_selector, None);

        let scoped = dir.path().join("scoped.json");
        fs::write(
            &scoped,
            r##"{"rootSelector": "#card", "operations": [{"selector": ":scope", "action": "setStyle", "styles": {"color": "red"}}]}"##,
        )
        .unwrap();
        let batch = read_batch(&scoped).unwrap();
        assert_eq!(batch.root_selector.as_deref(), Some("#card"));
        assert_eq!(batch.operations, vec![Operation::set_style(":scope", [("color", "red")])]);
    }

    #[test]
    fn test_apply_writes_page() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        let ops = dir.path().join("ops.json");
        let out = dir.path().join("out/page.html");
        fs::write(&page, "<html><head></head><body><h1>Hi</h1></body></html>").unwrap();
        fs::write(&ops, r#"[{"selector": "h1", "action": "replace", "content": "Hello"}]"#).unwrap();

        apply(
            ApplyArgs {
                page: page.clone(),
                operations: ops,
                root: None,
                out: Some(out.clone()),
                dry_run: false,
            },
            &dir.path().display().to_string(),
        )
        .unwrap();

        assert!(fs::read_to_string(&out).unwrap().contains("<h1>Hello</h1>"));
        assert!(fs::read_to_string(&page).unwrap().contains("<h1>Hi</h1>"));

        let dom = read_page(&out).unwrap();
        let again = write_page(&dom, &out, None).unwrap();
        assert_eq!(again, out);
    }
}
