//! Prompt template rendering.

use std::collections::HashMap;

use astra_rag::{DEFAULT_RAG_TEMPLATE, PromptTemplate, RagError, Role};

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn substitutes_every_placeholder() {
    let template = PromptTemplate::from("Q:{{question}} C:{{information}}");
    let variables = vars(&[("question", "Who is Johnny?"), ("information", "ctx")]);
    let prompt = template.apply(&variables).unwrap();
    assert_eq!(prompt.text(), "Q:Who is Johnny? C:ctx");
}

#[test]
fn missing_variable_is_reported_by_name() {
    let template = PromptTemplate::from("Q:{{question}} C:{{information}}");
    let err = template.apply(&vars(&[("question", "Who is Johnny?")])).unwrap_err();
    assert!(matches!(&err, RagError::MissingTemplateVariable(name) if name == "information"));
    assert_eq!(err.to_string(), "Value for the variable 'information' is missing");
}

#[test]
fn repeated_and_spaced_placeholders_share_a_value() {
    let template = PromptTemplate::from("{{ name }} and {{name}} again");
    assert_eq!(template.variables().len(), 1);
    let prompt = template.apply(&vars(&[("name", "Johnny")])).unwrap();
    assert_eq!(prompt.text(), "Johnny and Johnny again");
}

#[test]
fn values_are_inserted_literally() {
    let template = PromptTemplate::from("[{{a}}]");
    let prompt = template.apply(&vars(&[("a", "{{b}} $1 \\n")])).unwrap();
    assert_eq!(prompt.text(), "[{{b}} $1 \\n]");
}

#[test]
fn extra_variables_are_ignored() {
    let template = PromptTemplate::from("no placeholders");
    assert_eq!(template.apply(&vars(&[("unused", "x")])).unwrap().text(), "no placeholders");
}

#[test]
fn apply_single_fills_it() {
    let prompt =
        PromptTemplate::from("Summarize: {{it}}").apply_single("Johnny likes carrots").unwrap();
    assert_eq!(prompt.text(), "Summarize: Johnny likes carrots");
    assert_eq!(prompt.to_user_message().role, Role::User);
}

#[test]
fn default_template_asks_for_question_and_information() {
    let template = PromptTemplate::default();
    assert_eq!(template.template(), DEFAULT_RAG_TEMPLATE);
    let names: Vec<String> = template.variables().into_iter().collect();
    assert_eq!(names, vec!["information".to_string(), "question".to_string()]);
}
