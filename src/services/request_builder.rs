use crate::constants::sentinel::{DEFAULT_OUTPUT_FORMAT, MAX_OUTPUT_DIMENSION};
use crate::errors::ToolError;
use crate::models::{
    is_known_collection, AreaOfInterest, DataSourceSpec, ProcessingInputs, ProcessingRequest,
    QueryInputs, StatisticsInputs, StatisticsRequest, TimeRangeBody,
};
use crate::services::logger::Logger;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Validated core shared by both request kinds.
struct QueryParts {
    time: TimeRangeBody,
    evalscript: String,
    data: Vec<DataSourceSpec>,
    area: AreaOfInterest,
}

/// Turns tool arguments into typed request bodies. Pure apart from debug
/// logging.
#[derive(Clone)]
pub struct RequestBuilder {
    logger: Logger,
}

impl RequestBuilder {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: logger.child("request"),
        }
    }

    pub fn build_statistics_request(
        &self,
        inputs: &StatisticsInputs,
    ) -> Result<StatisticsRequest, ToolError> {
        let parts = self.build_query(&inputs.query)?;
        Ok(StatisticsRequest {
            time: parts.time,
            evalscript: parts.evalscript,
            data: parts.data,
            area: parts.area,
            aggregation: non_null(&inputs.aggregation),
            calculations: non_null(&inputs.calculations),
        })
    }

    pub fn build_processing_request(
        &self,
        inputs: &ProcessingInputs,
    ) -> Result<ProcessingRequest, ToolError> {
        let parts = self.build_query(&inputs.query)?;
        let width = dimension("width", inputs.width)?;
        let height = dimension("height", inputs.height)?;
        let format = inputs
            .output_format
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(DEFAULT_OUTPUT_FORMAT)
            .to_string();
        Ok(ProcessingRequest {
            time: parts.time,
            evalscript: parts.evalscript,
            data: parts.data,
            area: parts.area,
            format,
            width,
            height,
        })
    }

    fn build_query(&self, inputs: &QueryInputs) -> Result<QueryParts, ToolError> {
        let time = time_range(inputs.time_from.as_deref(), inputs.time_to.as_deref())?;

        let evalscript = inputs.evalscript.clone().unwrap_or_default();
        if evalscript.trim().is_empty() {
            return Err(ToolError::validation(
                "missing_evalscript",
                "evalscript is required and must not be empty",
            ));
        }

        let data = self.data_sources(inputs.data_sources.as_deref())?;
        let area = area_of_interest(inputs.geometry.as_ref(), inputs.bbox.as_deref())?;

        Ok(QueryParts {
            time,
            evalscript,
            data,
            area,
        })
    }

    fn data_sources(&self, raw: Option<&[Value]>) -> Result<Vec<DataSourceSpec>, ToolError> {
        let raw = raw.unwrap_or_default();
        if raw.is_empty() {
            return Err(ToolError::validation(
                "missing_data_sources",
                "data_sources must contain at least one entry",
            )
            .with_hint("e.g. [{\"type\": \"sentinel-2-l2a\"}]"));
        }

        let mut specs = Vec::with_capacity(raw.len());
        for (index, entry) in raw.iter().enumerate() {
            let spec: DataSourceSpec = serde_json::from_value(entry.clone()).map_err(|err| {
                ToolError::validation(
                    "invalid_data_sources",
                    format!("data_sources[{}] is malformed: {}", index, err),
                )
            })?;
            if spec.kind.trim().is_empty() {
                return Err(ToolError::validation(
                    "invalid_data_sources",
                    format!("data_sources[{}].type must not be empty", index),
                ));
            }
            if !is_known_collection(&spec.kind) {
                self.logger.debug(
                    "forwarding unrecognized data source type",
                    Some(&serde_json::json!({ "index": index, "type": spec.kind })),
                );
            }
            specs.push(spec);
        }
        Ok(specs)
    }
}

fn non_null(value: &Option<Value>) -> Option<Value> {
    value.as_ref().filter(|v| !v.is_null()).cloned()
}

fn time_range(from: Option<&str>, to: Option<&str>) -> Result<TimeRangeBody, ToolError> {
    let (from, to) = match (from.map(str::trim), to.map(str::trim)) {
        (Some(from), Some(to)) if !from.is_empty() && !to.is_empty() => (from, to),
        _ => {
            return Err(ToolError::validation(
                "invalid_time_range",
                "time_from and time_to are both required",
            ))
        }
    };
    let start = parse_instant(from).ok_or_else(|| unparseable("time_from", from))?;
    let end = parse_instant(to).ok_or_else(|| unparseable("time_to", to))?;
    if end < start {
        return Err(ToolError::validation(
            "invalid_time_range",
            format!("time_to ({}) precedes time_from ({})", to, from),
        ));
    }
    Ok(TimeRangeBody {
        from: from.to_string(),
        to: to.to_string(),
    })
}

fn unparseable(field: &str, value: &str) -> ToolError {
    ToolError::validation(
        "invalid_time_range",
        format!("{} is not an ISO-8601 date or timestamp: {}", field, value),
    )
    .with_hint("Use YYYY-MM-DD or an RFC 3339 timestamp such as 2024-01-01T00:00:00Z.")
}

/// Calendar dates count as midnight UTC.
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn area_of_interest(
    geometry: Option<&Value>,
    bbox: Option<&[f64]>,
) -> Result<AreaOfInterest, ToolError> {
    let geometry = geometry.filter(|g| !g.is_null());
    match (geometry, bbox) {
        (Some(geometry), None) => {
            let typed = geometry
                .get("type")
                .and_then(Value::as_str)
                .map(|t| !t.is_empty())
                .unwrap_or(false);
            if !typed {
                return Err(ToolError::validation(
                    "invalid_geometry",
                    "geometry must be a GeoJSON object with a string 'type'",
                ));
            }
            Ok(AreaOfInterest::Geometry(geometry.clone()))
        }
        (None, Some(bbox)) => {
            let coords: [f64; 4] = bbox.try_into().map_err(|_| {
                ToolError::validation(
                    "invalid_bbox",
                    format!("bbox must have exactly 4 numbers, got {}", bbox.len()),
                )
            })?;
            let [min_x, min_y, max_x, max_y] = coords;
            if coords.iter().any(|c| !c.is_finite()) || min_x > max_x || min_y > max_y {
                return Err(ToolError::validation(
                    "invalid_bbox",
                    "bbox must be [minX, minY, maxX, maxY] with min <= max",
                ));
            }
            Ok(AreaOfInterest::Bbox(coords))
        }
        (Some(_), Some(_)) => Err(ToolError::validation(
            "area_of_interest_ambiguous_or_missing",
            "provide either geometry or bbox, not both",
        )),
        (None, None) => Err(ToolError::validation(
            "area_of_interest_ambiguous_or_missing",
            "either geometry or bbox is required",
        )),
    }
}

fn dimension(field: &str, value: Option<i64>) -> Result<Option<u32>, ToolError> {
    match value {
        None => Ok(None),
        Some(v) if (1..=i64::from(MAX_OUTPUT_DIMENSION)).contains(&v) => Ok(Some(v as u32)),
        Some(v) => Err(ToolError::validation(
            "invalid_dimensions",
            format!(
                "{} must be between 1 and {}, got {}",
                field, MAX_OUTPUT_DIMENSION, v
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolErrorKind;
    use serde_json::json;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(Logger::new("test"))
    }

    fn query() -> QueryInputs {
        QueryInputs {
            geometry: None,
            bbox: Some(vec![13.0, 45.0, 14.0, 46.0]),
            time_from: Some("2024-01-01".to_string()),
            time_to: Some("2024-01-31".to_string()),
            evalscript: Some("//VERSION=3\nfunction setup() {}".to_string()),
            data_sources: Some(vec![json!({"type": "sentinel-2-l2a"})]),
        }
    }

    fn stats(query: QueryInputs) -> StatisticsInputs {
        StatisticsInputs {
            query,
            ..StatisticsInputs::default()
        }
    }

    fn code_of(err: ToolError) -> String {
        assert_eq!(err.kind, ToolErrorKind::ValidationError);
        err.code
    }

    #[test]
    fn bbox_only_builds_body_with_bbox() {
        let request = builder().build_statistics_request(&stats(query())).expect("request");
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(body["bbox"], json!([13.0, 45.0, 14.0, 46.0]));
        assert!(body.get("geometry").is_none());
        assert_eq!(body["time"], json!({"from": "2024-01-01", "to": "2024-01-31"}));
        assert_eq!(body["data"], json!([{"type": "sentinel-2-l2a"}]));
    }

    #[test]
    fn geometry_only_builds_body_with_geometry() {
        let mut q = query();
        q.bbox = None;
        q.geometry = Some(json!({"type": "Point", "coordinates": [13.5, 45.5]}));
        let request = builder().build_statistics_request(&stats(q)).expect("request");
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(body["geometry"]["type"], "Point");
        assert!(body.get("bbox").is_none());
    }

    #[test]
    fn both_or_neither_area_is_rejected() {
        let mut both = query();
        both.geometry = Some(json!({"type": "Point", "coordinates": [0, 0]}));
        let err = builder().build_statistics_request(&stats(both)).expect_err("both");
        assert_eq!(code_of(err), "area_of_interest_ambiguous_or_missing");

        let mut neither = query();
        neither.bbox = None;
        let err = builder().build_statistics_request(&stats(neither)).expect_err("neither");
        assert_eq!(code_of(err), "area_of_interest_ambiguous_or_missing");
    }

    #[test]
    fn reversed_time_range_is_rejected() {
        let mut q = query();
        q.time_from = Some("2024-02-01".to_string());
        q.time_to = Some("2024-01-01".to_string());
        let err = builder().build_statistics_request(&stats(q)).expect_err("reversed");
        assert_eq!(code_of(err), "invalid_time_range");
    }

    #[test]
    fn mixed_date_and_timestamp_compare_correctly() {
        let mut q = query();
        q.time_from = Some("2024-01-01".to_string());
        q.time_to = Some("2024-01-01T12:00:00Z".to_string());
        assert!(builder().build_statistics_request(&stats(q)).is_ok());
    }

    #[test]
    fn time_checked_before_evalscript() {
        let mut q = query();
        q.time_from = Some("yesterday".to_string());
        q.evalscript = None;
        let err = builder().build_statistics_request(&stats(q)).expect_err("time");
        assert_eq!(code_of(err), "invalid_time_range");
    }

    #[test]
    fn blank_evalscript_and_empty_sources_are_rejected() {
        let mut q = query();
        q.evalscript = Some("   ".to_string());
        let err = builder().build_statistics_request(&stats(q)).expect_err("script");
        assert_eq!(code_of(err), "missing_evalscript");

        let mut q = query();
        q.data_sources = Some(vec![]);
        let err = builder().build_statistics_request(&stats(q)).expect_err("sources");
        assert_eq!(code_of(err), "missing_data_sources");

        let mut q = query();
        q.data_sources = Some(vec![json!({"dataFilter": {}})]);
        let err = builder().build_statistics_request(&stats(q)).expect_err("untyped");
        assert_eq!(code_of(err), "invalid_data_sources");
    }

    #[test]
    fn unknown_collection_type_is_forwarded() {
        let mut q = query();
        q.data_sources = Some(vec![json!({"type": "byoc-1234"}), json!({"type": "dem"})]);
        let request = builder().build_statistics_request(&stats(q)).expect("request");
        assert_eq!(request.data[0].kind, "byoc-1234");
        assert_eq!(request.data[1].kind, "dem");
    }

    #[test]
    fn degenerate_bbox_is_rejected() {
        let mut q = query();
        q.bbox = Some(vec![14.0, 45.0, 13.0, 46.0]);
        let err = builder().build_statistics_request(&stats(q)).expect_err("bbox");
        assert_eq!(code_of(err), "invalid_bbox");

        let mut q = query();
        q.bbox = Some(vec![1.0, 2.0, 3.0]);
        let err = builder().build_statistics_request(&stats(q)).expect_err("short");
        assert_eq!(code_of(err), "invalid_bbox");
    }

    #[test]
    fn processing_defaults_format_to_png() {
        let inputs = ProcessingInputs {
            query: query(),
            ..ProcessingInputs::default()
        };
        let request = builder().build_processing_request(&inputs).expect("request");
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(body["format"], "image/png");
        assert!(body.get("width").is_none());
    }

    #[test]
    fn processing_dimensions_are_bounded() {
        let inputs = ProcessingInputs {
            query: query(),
            width: Some(512),
            height: Some(2501),
            output_format: Some("image/tiff".to_string()),
        };
        let err = builder().build_processing_request(&inputs).expect_err("height");
        assert_eq!(code_of(err), "invalid_dimensions");

        let inputs = ProcessingInputs {
            height: Some(512),
            ..inputs
        };
        let request = builder().build_processing_request(&inputs).expect("request");
        assert_eq!(request.width, Some(512));
        assert_eq!(request.format, "image/tiff");
    }

    #[test]
    fn aggregation_is_forwarded_opaque() {
        let inputs = StatisticsInputs {
            query: query(),
            aggregation: Some(json!({"aggregationInterval": {"of": "P1D"}})),
            calculations: None,
        };
        let request = builder().build_statistics_request(&inputs).expect("request");
        let body = serde_json::to_value(&request).expect("serialize");
        assert_eq!(body["aggregation"]["aggregationInterval"]["of"], "P1D");
        assert!(body.get("calculations").is_none());
    }
}
