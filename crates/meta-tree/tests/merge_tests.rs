//! Merge-action splicing through a full parse + render cycle.

use meta_config::Config;
use meta_tree::{parse, render, Context, ParseMode};

const TARGET: &str = "<CustomObject xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n\
    <fields>\n\
        <fullName>Alpha__c</fullName>\n\
        <type>Text</type>\n\
    </fields>\n\
    <fields>\n\
        <fullName>Gamma__c</fullName>\n\
        <type>Number</type>\n\
    </fields>\n\
    <indexes/>\n\
    <sharingModel>ReadWrite</sharingModel>\n\
</CustomObject>\n";

fn merge(config: &Config, actions: impl FnOnce(&mut meta_tree::ActionNode)) -> (String, Vec<String>, Vec<String>) {
    let mut ctx = Context::new(config, ParseMode::Merge, "", "objects/Account.object");
    actions(&mut ctx.actions);
    let tree = parse(&mut ctx, TARGET).unwrap();
    let rendered = render(&tree, config);
    let leftovers = ctx.actions.leftovers();
    (rendered, ctx.notes, leftovers)
}

#[test]
fn create_item_lands_in_sorted_position_after_render() {
    let config = Config::builtin();
    let (out, _, leftovers) = merge(&config, |actions| {
        actions.insert_create(
            &["fields=Beta__c", "#CONTENTS#"],
            "    <fields>\n        <fullName>Beta__c</fullName>\n        <type>Date</type>\n    </fields>\n"
                .to_string(),
        );
    });
    let alpha = out.find("Alpha__c").unwrap();
    let beta = out.find("Beta__c").unwrap();
    let gamma = out.find("Gamma__c").unwrap();
    assert!(alpha < beta && beta < gamma);
    assert!(leftovers.is_empty());
}

#[test]
fn update_item_on_params_section() {
    let config = Config::builtin();
    let (out, _, leftovers) = merge(&config, |actions| {
        actions.insert_change(
            &["sharingModel=#PARAM#"],
            "    <sharingModel>Private</sharingModel>\n".to_string(),
        );
    });
    assert!(out.contains("<sharingModel>Private</sharingModel>"));
    assert!(!out.contains("ReadWrite"));
    assert!(leftovers.is_empty());
}

#[test]
fn delete_item_removes_empty_section() {
    let config = Config::builtin();
    let (out, _, leftovers) = merge(&config, |actions| {
        actions.insert_delete(&["indexes=#SINGLE#"]);
    });
    assert!(!out.contains("<indexes/>"));
    assert!(leftovers.is_empty());
}

#[test]
fn delete_item_removes_field_entry() {
    let config = Config::builtin();
    let (out, _, leftovers) = merge(&config, |actions| {
        actions.insert_delete(&["fields=Gamma__c"]);
    });
    assert!(!out.contains("Gamma__c"));
    assert!(out.contains("Alpha__c"));
    assert!(leftovers.is_empty());
}

#[test]
fn rerunning_a_completed_merge_is_a_noop_with_notes() {
    let config = Config::builtin();
    // First run inserts Beta__c.
    let (after_first, _, _) = merge(&config, |actions| {
        actions.insert_create(
            &["fields=Beta__c", "#CONTENTS#"],
            "    <fields>\n        <fullName>Beta__c</fullName>\n        <type>Date</type>\n    </fields>\n"
                .to_string(),
        );
    });

    // Second run against the already-updated target.
    let mut ctx = Context::new(&config, ParseMode::Merge, "", "objects/Account.object");
    ctx.actions.insert_create(
        &["fields=Beta__c", "#CONTENTS#"],
        "    <fields>\n        <fullName>Beta__c</fullName>\n        <type>Date</type>\n    </fields>\n"
            .to_string(),
    );
    let tree = parse(&mut ctx, &after_first).unwrap();
    let after_second = render(&tree, &config);

    assert_eq!(after_first, after_second);
    assert_eq!(ctx.notes.len(), 1);
    assert!(ctx.notes[0].contains("already updated"));
    assert!(ctx.actions.is_empty());
}

#[test]
fn unmatched_actions_surface_as_leftovers() {
    let config = Config::builtin();
    let (out, _, leftovers) = merge(&config, |actions| {
        actions.insert_change(&["fields=Missing__c"], "x\n".to_string());
        actions.insert_delete(&["webLinks=NotHere"]);
    });
    assert_eq!(out, render_unchanged(&config));
    assert_eq!(leftovers.len(), 2);
}

fn render_unchanged(config: &Config) -> String {
    let mut ctx = Context::new(config, ParseMode::Plain, "", "objects/Account.object");
    let tree = parse(&mut ctx, TARGET).unwrap();
    render(&tree, config)
}

#[test]
fn deep_update_through_subsection_levels() {
    let config = Config::builtin();
    let deep_target = "<CustomObject xmlns=\"x\">\n\
    <fields>\n\
        <fullName>Status__c</fullName>\n\
        <valueSet>\n\
            <restricted>true</restricted>\n\
        </valueSet>\n\
    </fields>\n\
</CustomObject>\n";
    let vs_block = "        <valueSet>\n            <restricted>true</restricted>\n        </valueSet>\n";
    let (vs_key, _) = meta_tree::key::synthesize(vs_block, &meta_config::SortRule::Content);

    let mut ctx = Context::new(&config, ParseMode::Merge, "", "objects/Case.object");
    ctx.actions.insert_change(
        &["fields=Status__c", &format!("valueSet={vs_key}")],
        "        <valueSet>\n            <restricted>false</restricted>\n        </valueSet>\n"
            .to_string(),
    );
    let tree = parse(&mut ctx, deep_target).unwrap();
    let out = render(&tree, &config);
    assert!(out.contains("<restricted>false</restricted>"));
    assert!(ctx.actions.is_empty());
}
