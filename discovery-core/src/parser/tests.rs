use super::*;

#[test]
fn test_fenced_block_is_preferred() {
    let text = r#"Here are the questions:

```json
[
  {"question": "What is the target response time?", "context": "Performance is vague", "priority": 1},
  {"question": "Which browsers are supported?", "priority": 2}
]
```

Let me know if you need more."#;

    let parsed = parse_list(text);
    assert_eq!(parsed.tier(), "fenced");
    let records = parsed.into_inner();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["question"], "What is the target response time?");
}

#[test]
fn test_raw_json_is_decoded_directly() {
    let text = r#"[{"question": "Who approves deliverables?", "priority": "1"}]"#;

    let parsed = parse_list(text);
    assert_eq!(parsed.tier(), "direct");
    assert_eq!(parsed.into_inner().len(), 1);
}

#[test]
fn test_json_wrapped_in_prose_is_decoded() {
    let text = r#"Sure! {"in_scope": ["portal"], "out_of_scope": [], "unclear": ["hosting"]} Hope this helps."#;

    let parsed = parse_object(text);
    assert_eq!(parsed.tier(), "direct");
    let object = parsed.into_inner();
    assert_eq!(object["unclear"][0], "hosting");
}

#[test]
fn test_prose_yields_empty() {
    let parsed = parse_list("I could not find anything worth asking about in this section.");
    assert!(parsed.is_empty());
    assert!(parsed.into_inner().is_empty());

    assert!(parse_object("").is_empty());
}

#[test]
fn test_truncated_json_yields_partial_list() {
    let text = r#"```json
[
  {"question": "What uptime is required?", "priority": 1},
  {"question": "Is there a maintenance wind"#;

    let records = parse_list(text).into_inner();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["question"], "What uptime is required?");
}

#[test]
fn test_corrupted_json_never_panics() {
    for text in [
        "[{",
        "```json\n{{{{\n```",
        "}]",
        "\"unterminated",
        "[1, 2, 3]",
        "{\"a\": [}",
    ] {
        let _ = parse_list(text);
        let _ = parse_object(text);
    }
}

#[test]
fn test_wrapper_object_is_unwrapped_for_lists() {
    let text = r#"{"questions": [{"question": "A?"}, {"question": "B?"}]}"#;
    assert_eq!(parse_list(text).into_inner().len(), 2);
}

#[test]
fn test_heuristic_question_lines() {
    let text = "Question: What is the expected concurrency?
Context: The SOW only says the system must scale
Priority: 1

- Question: Who owns the hosting account?
- Context: Hosting is unclear
- Priority: High
- Target Stakeholder: IT lead";

    let parsed = parse_list(text);
    assert_eq!(parsed.tier(), "heuristic");
    let records = parsed.into_inner();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["question"], "Who owns the hosting account?");
    assert_eq!(records[1]["target_stakeholder"], "IT lead");
}

#[test]
fn test_heuristic_answer_blocks() {
    let text = "Question 1
Answer found: yes
Answer: Pages must load within 2 seconds
Confidence: 0.9
Explanation: stated by the CTO

Question 2
Answer found: no";

    let records = heuristic_records(text);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["question_index"], 1);
    assert_eq!(records[0]["answer_found"], "yes");
    assert_eq!(records[1]["question_index"], 2);
}

#[test]
fn test_unknown_keys_are_ignored() {
    let records = heuristic_records("Note: nothing here\nSummary: still nothing");
    assert!(records.is_empty());
}

#[test]
fn test_salvage_ignores_braces_inside_strings() {
    let text = r#"[{"question": "Does {scope} include hosting?"}, {"question": "bro"#;
    let records = salvage_objects(text);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["question"], "Does {scope} include hosting?");
}
