//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which walks the bases
//! referenced by a target's kustomization files and displays them in a
//! hierarchical format, with the restriction each root is loaded under.
//!
//! Remote bases are cloned while their subtree is walked and removed
//! afterwards. This command does not modify any files.

use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use target_loader::output::{emoji, kind_label, restriction_label, OutputConfig};
use target_loader::resources::{walk, BaseNode};

use crate::cli::Context;
use crate::commands::report;

/// Display the tree of bases reachable from a target
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Directory, file or git repository URL to start from.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Maximum depth of bases to resolve.
    ///
    /// If not specified, resolves the full tree.
    /// Use 0 to show only the target itself, 1 to show its direct bases, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Tree node structure for ptree visualization
#[derive(Clone, Debug)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}

fn leaf(label: String) -> TreeNode {
    TreeNode {
        label,
        children: vec![],
    }
}

/// Build a tree node from a walked base
fn build_tree_node(output: &OutputConfig, base: &BaseNode) -> TreeNode {
    let label = format!(
        "{} [{}, {}] {}",
        base.label,
        kind_label(output, base.kind),
        restriction_label(output, base.restriction),
        base.root.join(&base.kustomization).display()
    );

    let mut children: Vec<TreeNode> = base
        .files
        .iter()
        .map(|file| leaf(format!("{} {}", emoji(output, "📄", "-"), file)))
        .collect();
    children.extend(base.children.iter().map(|child| build_tree_node(output, child)));
    if base.truncated {
        children.push(leaf("...".to_string()));
    }

    TreeNode { label, children }
}

fn build(args: &TreeArgs, ctx: &Context) -> Result<TreeNode> {
    let loader = ctx
        .resolver
        .resolve(ctx.restriction, &args.target)
        .map_err(report)?;
    let base = walk(&loader, &args.target, args.depth).map_err(report)?;
    loader.close().map_err(report)?;
    Ok(build_tree_node(&ctx.output, &base))
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs, ctx: &Context) -> Result<()> {
    let tree_root = build(&args, ctx)?;
    println!(
        "{} Base tree for: {}",
        emoji(&ctx.output, "🌳", "[TREE]"),
        args.target
    );
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    Ok(())
}

#[cfg(test)]
fn render(tree_root: &TreeNode) -> Result<String> {
    let mut buf = Vec::new();
    ptree::write_tree(tree_root, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}
