//! Style variable resolution: which semantic fields does a style
//! actually render for a given record type?
//!
//! The walk is conditional-scope aware. Plain elements contribute their
//! `variable` attribute and recurse. A `choose` group evaluates its
//! type-guarded branches in document order and, on the first match,
//! collects every variable in that branch's subtree without further
//! type narrowing. Branches conditioned on something other than type
//! can never be ruled out by type alone, so they are always recursed
//! normally. The `else` fallback only fires when the group actually
//! discriminated by type and no type matched; a group with no
//! type-guarded branch treats `else` as just another recursion target.

use crate::tree::{StyleNode, parse_style_tree};
use biblioref_model::RecordType;
use std::collections::BTreeSet;

/// Map a record type into the style vocabulary's type names.
pub fn csl_type_for(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::JournalArticle => "article-journal",
        RecordType::Book => "book",
        RecordType::BookChapter => "chapter",
        RecordType::ConferencePaper => "paper-conference",
        RecordType::Thesis => "thesis",
        RecordType::Report => "report",
        RecordType::Webpage => "webpage",
        RecordType::Other => "article",
    }
}

fn add_own_variables(node: &StyleNode, out: &mut BTreeSet<String>) {
    if let Some(vars) = node.attr("variable") {
        for name in vars.split_whitespace() {
            out.insert(name.to_string());
        }
    }
}

/// Collect every variable in a subtree, ignoring all conditions. Used
/// once a type-guarded branch has matched: inside a matched branch no
/// further type narrowing applies.
fn collect_all(node: &StyleNode, out: &mut BTreeSet<String>) {
    add_own_variables(node, out);
    for child in &node.children {
        collect_all(child, out);
    }
}

fn walk(node: &StyleNode, csl_type: &str, out: &mut BTreeSet<String>) {
    if node.name == "choose" {
        resolve_choose(node, csl_type, out);
        return;
    }
    add_own_variables(node, out);
    for child in &node.children {
        walk(child, csl_type, out);
    }
}

fn resolve_choose(group: &StyleNode, csl_type: &str, out: &mut BTreeSet<String>) {
    let mut saw_type_guard = false;
    let mut type_matched = false;
    let mut fallback: Option<&StyleNode> = None;

    for branch in &group.children {
        if branch.name == "else" {
            // Handled after the guarded branches are known.
            fallback = Some(branch);
            continue;
        }
        match branch.attr("type") {
            Some(types) => {
                saw_type_guard = true;
                if !type_matched && types.split_whitespace().any(|t| t == csl_type) {
                    type_matched = true;
                    collect_all(branch, out);
                }
            }
            // Conditioned on something other than type (e.g. a
            // variable's presence); type can never rule it out.
            None => walk(branch, csl_type, out),
        }
    }

    if let Some(branch) = fallback {
        if saw_type_guard {
            if !type_matched {
                collect_all(branch, out);
            }
        } else {
            walk(branch, csl_type, out);
        }
    }
}

/// Resolve the set of variables a style renders for a style-vocabulary
/// type name.
pub fn variables_for_type(tree: &StyleNode, csl_type: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    walk(tree, csl_type, &mut out);
    out
}

/// Resolve against a record type, parsing the style text first.
/// Malformed style descriptions yield an empty set.
pub fn variables_for_record_type(style_text: &str, record_type: RecordType) -> BTreeSet<String> {
    match parse_style_tree(style_text) {
        Ok(tree) => variables_for_type(&tree, csl_type_for(record_type)),
        Err(err) => {
            tracing::debug!(%err, "unparseable style, resolving to empty variable set");
            BTreeSet::new()
        }
    }
}

/// Translate resolved style variables into the record fields an editor
/// should surface. Unknown variables are dropped.
pub fn editor_fields_for_variables(variables: &BTreeSet<String>) -> BTreeSet<&'static str> {
    let mut fields = BTreeSet::new();
    for var in variables {
        let field = match var.as_str() {
            "title" => "title",
            "title-short" => "title_alt",
            "author" => "authors",
            "issued" => "year",
            "container-title" | "collection-title" => "container_title",
            "volume" => "volume",
            "issue" => "issue",
            "page" => "pages",
            "DOI" => "doi",
            "URL" => "url",
            "publisher" => "publisher",
            "institution" => "institution",
            "language" => "language",
            _ => continue,
        };
        fields.insert(field);
    }
    fields
}
