//! Deep-linking content items: LTI 1.3 array → legacy JSON-LD graph
//!
//! Only the modern → legacy direction exists. Tools answering a 1.1 selection request
//! expect the `ContentItem` graph; the reverse transform is not provided.

use serde_json::{Map, Value, json};

use crate::error::ContentItemError;

/// JSON-LD context of the legacy content-item graph.
pub const CONTENT_ITEM_CONTEXT: &str = "http://purl.imsglobal.org/ctx/lti/v1/ContentItem";

/// Media type of an LTI link item.
pub const LTI_LINK_MEDIA_TYPE: &str = "application/vnd.ims.lti.v1.ltilink";

/// Reporting method attached to every expanded line item.
pub const TOTAL_SCORE_REPORTING_METHOD: &str =
    "http://purl.imsglobal.org/ctx/lis/v2p1/Result#totalScore";

/// Convert a JSON-encoded content-item array to the legacy graph encoding.
///
/// Valid JSON that is not an array is returned unchanged.
///
/// # Errors
///
/// Returns [`ContentItemError::Malformed`] when `json` does not parse.
pub fn convert_content_items_modern_to_legacy(json: &str) -> Result<String, ContentItemError> {
    let value: Value = serde_json::from_str(json)?;
    Ok(match to_legacy_graph(&value) {
        Some(graph) => graph.to_string(),
        None => json.to_string(),
    })
}

/// Wrap an already parsed item array into the legacy envelope.
///
/// Returns `None` when `items` is not an array.
pub fn to_legacy_graph(items: &Value) -> Option<Value> {
    let items = items.as_array()?;
    let graph: Vec<Value> = items.iter().map(convert_item).collect();
    Some(json!({
        "@context": CONTENT_ITEM_CONTEXT,
        "@graph": graph,
    }))
}

fn convert_item(item: &Value) -> Value {
    let Some(source) = item.as_object() else {
        return item.clone();
    };

    let mut out = source.clone();
    out.remove("type");
    if let Some((item_type, media_type)) = item_type(source.get("type").and_then(Value::as_str)) {
        out.insert("@type".into(), Value::from(item_type));
        if let Some(media_type) = media_type {
            out.insert("mediaType".into(), Value::from(media_type));
        }
    }

    if let Some(html) = out.remove("html") {
        out.insert("text".into(), html);
    }

    let advice = placement_advice(source);
    for key in ["iframe", "window", "presentation"] {
        out.remove(key);
    }
    if let Some(advice) = advice {
        out.insert("placementAdvice".into(), Value::Object(advice));
    }

    for key in ["icon", "thumbnail"] {
        if let Some(Value::Object(image)) = out.get_mut(key)
            && let Some(url) = image.remove("url")
        {
            image.insert("@id".into(), url);
        }
    }

    if let Some(line_item) = source.get("lineItem") {
        out.insert("lineItem".into(), expand_line_item(line_item));
    }

    Value::Object(out)
}

fn item_type(kind: Option<&str>) -> Option<(&'static str, Option<&'static str>)> {
    match kind? {
        "ltiResourceLink" | "resource-link" => Some(("LtiLinkItem", Some(LTI_LINK_MEDIA_TYPE))),
        "link" | "html" | "rich" => Some(("ContentItem", Some("text/html"))),
        "file" => Some(("FileItem", None)),
        _ => None,
    }
}

/// First present of `iframe`, `window`, `presentation`.
fn placement_advice(item: &Map<String, Value>) -> Option<Map<String, Value>> {
    let mut advice = Map::new();

    if let Some(iframe) = item.get("iframe") {
        advice.insert("presentationDocumentTarget".into(), Value::from("iframe"));
        copy_dimensions(iframe, &mut advice);
        return Some(advice);
    }

    if let Some(window) = item.get("window") {
        advice.insert("presentationDocumentTarget".into(), Value::from("window"));
        if let Some(target) = window.get("targetName") {
            advice.insert("windowTarget".into(), target.clone());
        }
        copy_dimensions(window, &mut advice);
        return Some(advice);
    }

    if let Some(presentation) = item.get("presentation") {
        if let Some(target) = presentation.get("documentTarget") {
            advice.insert("presentationDocumentTarget".into(), target.clone());
        }
        copy_dimensions(presentation, &mut advice);
        return Some(advice);
    }

    None
}

fn copy_dimensions(source: &Value, advice: &mut Map<String, Value>) {
    if let Some(width) = source.get("width") {
        advice.insert("displayWidth".into(), width.clone());
    }
    if let Some(height) = source.get("height") {
        advice.insert("displayHeight".into(), height.clone());
    }
}

fn expand_line_item(line_item: &Value) -> Value {
    let mut out = Map::new();
    out.insert("@type".into(), Value::from("LineItem"));
    out.insert(
        "reportingMethod".into(),
        Value::from(TOTAL_SCORE_REPORTING_METHOD),
    );
    if let Some(label) = line_item.get("label") {
        out.insert("label".into(), label.clone());
    }
    if let Some(tag) = line_item.get("tag") {
        out.insert("tag".into(), tag.clone());
    }
    if let Some(resource_id) = line_item.get("resourceId") {
        out.insert(
            "assignedActivity".into(),
            json!({ "activityId": resource_id }),
        );
    }
    if let Some(maximum) = line_item.get("scoreMaximum") {
        out.insert(
            "scoreConstraints".into(),
            json!({ "@type": "NumericLimits", "totalMaximum": maximum }),
        );
    }
    if let Some(review) = line_item.get("submissionReview") {
        out.insert("submissionReview".into(), review.clone());
    }
    Value::Object(out)
}
