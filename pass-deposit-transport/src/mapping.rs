// SPDX-FileCopyrightText: 2026 Eclipse PASS deposit contributors
// SPDX-License-Identifier: MIT

//! Submission metadata rendered for the REST repositories.

use pass_deposit_model::{PersonType, Submission};
use serde_json::{Value, json};

const DSPACE_SECTION: &str = "traditionalpageone";

fn add_values(section: &str, key: &str, values: &[&str]) -> Value {
    let values: Vec<Value> = values.iter().map(|v| json!({ "value": v })).collect();
    json!({
        "op": "add",
        "path": format!("/sections/{section}/{key}"),
        "value": values,
    })
}

/// JSON Patch operations filling a DSpace workspace item's describe form.
pub fn dspace_patch(submission: &Submission) -> Value {
    let md = &submission.metadata;
    let mut ops = Vec::new();

    if let Some(title) = submission.title() {
        ops.push(add_values(DSPACE_SECTION, "dc.title", &[title]));
    }
    if let Some(publisher) = md.journal.as_ref().and_then(|j| j.publisher_name.as_deref()) {
        ops.push(add_values(DSPACE_SECTION, "dc.publisher", &[publisher]));
    }
    if let Some(doi) = md.article.as_ref().and_then(|a| a.doi.as_deref()) {
        ops.push(add_values(DSPACE_SECTION, "dc.identifier.doi", &[doi]));
    }
    if let Some(abstract_) = md.manuscript.as_ref().and_then(|m| m.msabstract.as_deref()) {
        ops.push(add_values(DSPACE_SECTION, "dc.description.abstract", &[abstract_]));
    }
    if let Some(date) = md.journal.as_ref().and_then(|j| j.publication_date.as_deref()) {
        ops.push(add_values(DSPACE_SECTION, "dc.date.issued", &[date]));
    }

    let authors: Vec<String> = md
        .persons
        .iter()
        .filter(|p| p.kind != PersonType::Submitter)
        .map(|p| p.reversed_name())
        .collect();
    if !authors.is_empty() {
        let authors: Vec<&str> = authors.iter().map(String::as_str).collect();
        ops.push(add_values(DSPACE_SECTION, "dc.contributor.author", &authors));
    }

    ops.push(json!({ "op": "add", "path": "/sections/license/granted", "value": "true" }));
    Value::Array(ops)
}

/// The body of an InvenioRDM draft record.
pub fn invenio_record(submission: &Submission, title: &str) -> Value {
    let md = &submission.metadata;
    let creators: Vec<Value> = md
        .persons
        .iter()
        .map(|p| {
            json!({
                "person_or_org": {
                    "type": "personal",
                    "name": p.reversed_name(),
                    "given_name": p.given_name(),
                    "family_name": p.last_name,
                }
            })
        })
        .collect();

    let mut metadata = json!({
        "resource_type": { "id": "publication-article" },
        "title": title,
        "creators": creators,
    });
    if let Some(date) = md.journal.as_ref().and_then(|j| j.publication_date.as_deref()) {
        metadata["publication_date"] = json!(date);
    }

    json!({
        "access": { "record": "public", "files": "public" },
        "files": { "enabled": true },
        "metadata": metadata,
    })
}
