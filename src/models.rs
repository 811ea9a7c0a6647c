use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a query looks. Serialized flattened, so a request body carries
/// either a `geometry` or a `bbox` key, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaOfInterest {
    Geometry(Value),
    Bbox([f64; 4]),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRangeBody {
    pub from: String,
    pub to: String,
}

/// One entry of a request's `data` list. Only `type` is interpreted;
/// `dataFilter` and any other fields are sent back out as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "dataFilter", default, skip_serializing_if = "Option::is_none")]
    pub data_filter: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Arguments shared by the statistics and processing tools. Everything is
/// optional here; presence and shape are enforced by the request builder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryInputs {
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub time_from: Option<String>,
    #[serde(default)]
    pub time_to: Option<String>,
    #[serde(default)]
    pub evalscript: Option<String>,
    #[serde(default)]
    pub data_sources: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatisticsInputs {
    #[serde(flatten)]
    pub query: QueryInputs,
    #[serde(default)]
    pub aggregation: Option<Value>,
    #[serde(default)]
    pub calculations: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessingInputs {
    #[serde(flatten)]
    pub query: QueryInputs,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub output_format: Option<String>,
}

/// Body for `POST /statistics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRequest {
    pub time: TimeRangeBody,
    pub evalscript: String,
    pub data: Vec<DataSourceSpec>,
    #[serde(flatten)]
    pub area: AreaOfInterest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculations: Option<Value>,
}

/// Body for `POST /process`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingRequest {
    pub time: TimeRangeBody,
    pub evalscript: String,
    pub data: Vec<DataSourceSpec>,
    #[serde(flatten)]
    pub area: AreaOfInterest,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// Summary echoed back with statistics and processing results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestInfo {
    pub time_range: String,
    pub data_sources: usize,
    pub has_geometry: bool,
    pub has_bbox: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

impl RequestInfo {
    pub fn new(time: &TimeRangeBody, data: &[DataSourceSpec], area: &AreaOfInterest) -> Self {
        Self {
            time_range: format!("{} to {}", time.from, time.to),
            data_sources: data.len(),
            has_geometry: matches!(area, AreaOfInterest::Geometry(_)),
            has_bbox: matches!(area, AreaOfInterest::Bbox(_)),
            output_format: None,
        }
    }

    pub fn with_output_format(mut self, format: &str) -> Self {
        self.output_format = Some(format.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataCollection {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const KNOWN_COLLECTIONS: &[DataCollection] = &[
    DataCollection {
        id: "sentinel-1-grd",
        name: "Sentinel-1 GRD",
        description: "C-band SAR ground range detected backscatter, all weather, day and night",
    },
    DataCollection {
        id: "sentinel-2-l1c",
        name: "Sentinel-2 L1C",
        description: "Multispectral top-of-atmosphere reflectance, 13 bands, 10-60 m",
    },
    DataCollection {
        id: "sentinel-2-l2a",
        name: "Sentinel-2 L2A",
        description: "Multispectral bottom-of-atmosphere reflectance with scene classification",
    },
    DataCollection {
        id: "sentinel-3-olci",
        name: "Sentinel-3 OLCI",
        description: "Ocean and land colour instrument, 21 bands, 300 m",
    },
    DataCollection {
        id: "sentinel-3-slstr",
        name: "Sentinel-3 SLSTR",
        description: "Sea and land surface temperature radiometer",
    },
    DataCollection {
        id: "sentinel-5p-l2",
        name: "Sentinel-5P L2",
        description: "Atmospheric trace gases and aerosols (TROPOMI)",
    },
    DataCollection {
        id: "landsat-ot-l1",
        name: "Landsat 8-9 L1",
        description: "OLI/TIRS top-of-atmosphere reflectance and brightness temperature",
    },
    DataCollection {
        id: "landsat-ot-l2",
        name: "Landsat 8-9 L2",
        description: "OLI/TIRS surface reflectance and surface temperature",
    },
    DataCollection {
        id: "landsat-etm-l1",
        name: "Landsat 7 ETM+ L1",
        description: "Enhanced thematic mapper plus, top-of-atmosphere",
    },
    DataCollection {
        id: "landsat-etm-l2",
        name: "Landsat 7 ETM+ L2",
        description: "Enhanced thematic mapper plus, surface reflectance",
    },
    DataCollection {
        id: "landsat-tm-l1",
        name: "Landsat 4-5 TM L1",
        description: "Thematic mapper, top-of-atmosphere",
    },
    DataCollection {
        id: "landsat-tm-l2",
        name: "Landsat 4-5 TM L2",
        description: "Thematic mapper, surface reflectance",
    },
    DataCollection {
        id: "landsat-mss-l1",
        name: "Landsat 1-5 MSS L1",
        description: "Multispectral scanner archive, top-of-atmosphere",
    },
    DataCollection {
        id: "modis",
        name: "MODIS MCD43A4",
        description: "Nadir BRDF-adjusted daily reflectance, 500 m",
    },
    DataCollection {
        id: "dem",
        name: "DEM",
        description: "Digital elevation models (Copernicus, Mapzen)",
    },
    DataCollection {
        id: "hls",
        name: "Harmonized Landsat Sentinel",
        description: "Harmonized Landsat 8-9 and Sentinel-2 surface reflectance, 30 m",
    },
];

pub fn is_known_collection(id: &str) -> bool {
    KNOWN_COLLECTIONS.iter().any(|c| c.id == id)
}
