use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProxyError, ProxyResult};

/// Query parameters accepted on `/api/tourapi`.
///
/// Everything arrives as an optional string; blank values count as absent.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundQuery {
    pub by: Option<String>,
    pub map_x: Option<String>,
    pub map_y: Option<String>,
    pub radius: Option<String>,
    pub page_no: Option<String>,
    pub num_of_rows: Option<String>,
    pub content_type_id: Option<String>,
    pub area_code: Option<String>,
    pub sigungu_code: Option<String>,
    pub arrange: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl InboundQuery {
    /// Resolves the `by` selector, defaulting to [`Mode::Location`].
    pub fn mode(&self) -> ProxyResult<Mode> {
        match present(&self.by) {
            None => Ok(Mode::Location),
            Some(raw) => raw.parse(),
        }
    }

    pub fn arrange(&self) -> Option<&str> {
        present(&self.arrange)
    }
}

/// Lookup mode selected by the `by` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Location,
    Area,
}

impl FromStr for Mode {
    type Err = ProxyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "location" => Ok(Mode::Location),
            "area" => Ok(Mode::Area),
            other => Err(ProxyError::InvalidParameter(format!(
                "Invalid 'by' param '{other}' (expected location|area)"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Location => write!(f, "location"),
            Mode::Area => write!(f, "area"),
        }
    }
}

/// TourAPI service generation. Each one has its own service path and
/// resource suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiGeneration {
    V1,
    #[default]
    V2,
}

impl ApiGeneration {
    pub fn service_path(&self) -> &'static str {
        match self {
            ApiGeneration::V1 => "KorService1",
            ApiGeneration::V2 => "KorService2",
        }
    }

    pub fn resource(&self, mode: Mode) -> &'static str {
        match (self, mode) {
            (ApiGeneration::V1, Mode::Location) => "locationBasedList1",
            (ApiGeneration::V1, Mode::Area) => "areaBasedList1",
            (ApiGeneration::V2, Mode::Location) => "locationBasedList2",
            (ApiGeneration::V2, Mode::Area) => "areaBasedList2",
        }
    }
}

impl FromStr for ApiGeneration {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "v1" | "V1" => Ok(ApiGeneration::V1),
            "2" | "v2" | "V2" => Ok(ApiGeneration::V2),
            other => Err(anyhow::anyhow!("unknown API generation '{other}'")),
        }
    }
}

/// Validated parameters for `by=location`.
///
/// Integer fields are checked to parse as `u32` but keep the client's text.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationParams {
    /// Longitude, forwarded as the client wrote it.
    pub map_x: String,
    /// Latitude, forwarded as the client wrote it.
    pub map_y: String,
    pub radius: String,
    pub page_no: String,
    pub num_of_rows: String,
    pub content_type_id: String,
}

impl LocationParams {
    pub fn from_query(query: &InboundQuery) -> ProxyResult<Self> {
        let (Some(map_x), Some(map_y)) = (present(&query.map_x), present(&query.map_y)) else {
            return Err(ProxyError::InvalidParameter("Missing mapX/mapY".to_string()));
        };

        Ok(Self {
            map_x: coordinate("mapX", map_x)?,
            map_y: coordinate("mapY", map_y)?,
            radius: number_or("radius", &query.radius, 5000)?,
            page_no: number_or("pageNo", &query.page_no, 1)?,
            num_of_rows: number_or("numOfRows", &query.num_of_rows, 30)?,
            content_type_id: number_or("contentTypeId", &query.content_type_id, 12)?,
        })
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mapX", self.map_x.clone()),
            ("mapY", self.map_y.clone()),
            ("radius", self.radius.clone()),
            ("pageNo", self.page_no.clone()),
            ("numOfRows", self.num_of_rows.clone()),
            ("contentTypeId", self.content_type_id.clone()),
        ]
    }
}

/// Validated parameters for `by=area`.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaParams {
    pub area_code: String,
    /// Empty means "not sent".
    pub sigungu_code: String,
    pub page_no: String,
    pub num_of_rows: String,
    pub content_type_id: String,
}

impl AreaParams {
    pub fn from_query(query: &InboundQuery) -> ProxyResult<Self> {
        let Some(area_code) = present(&query.area_code) else {
            return Err(ProxyError::InvalidParameter("Missing areaCode".to_string()));
        };

        Ok(Self {
            area_code: area_code.to_string(),
            sigungu_code: present(&query.sigungu_code).unwrap_or_default().to_string(),
            page_no: number_or("pageNo", &query.page_no, 1)?,
            num_of_rows: number_or("numOfRows", &query.num_of_rows, 100)?,
            content_type_id: number_or("contentTypeId", &query.content_type_id, 12)?,
        })
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("areaCode", self.area_code.clone()),
            ("pageNo", self.page_no.clone()),
            ("numOfRows", self.num_of_rows.clone()),
            ("contentTypeId", self.content_type_id.clone()),
        ];
        if !self.sigungu_code.is_empty() {
            pairs.push(("sigunguCode", self.sigungu_code.clone()));
        }
        pairs
    }
}

/// Mode-specific parameters after validation and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub enum ModeParams {
    Location(LocationParams),
    Area(AreaParams),
}

impl ModeParams {
    pub fn resolve(mode: Mode, query: &InboundQuery) -> ProxyResult<Self> {
        match mode {
            Mode::Location => LocationParams::from_query(query).map(ModeParams::Location),
            Mode::Area => AreaParams::from_query(query).map(ModeParams::Area),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            ModeParams::Location(_) => Mode::Location,
            ModeParams::Area(_) => Mode::Area,
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            ModeParams::Location(params) => params.query_pairs(),
            ModeParams::Area(params) => params.query_pairs(),
        }
    }
}

fn coordinate(name: &str, raw: &str) -> ProxyResult<String> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(raw.to_string()),
        _ => Err(ProxyError::InvalidParameter(format!(
            "Invalid {name} '{raw}' (expected a number)"
        ))),
    }
}

fn number_or(name: &str, value: &Option<String>, default: u32) -> ProxyResult<String> {
    match present(value) {
        None => Ok(default.to_string()),
        Some(raw) => match raw.parse::<u32>() {
            Ok(_) => Ok(raw.to_string()),
            Err(_) => Err(ProxyError::InvalidParameter(format!(
                "Invalid {name} '{raw}' (expected a non-negative integer)"
            ))),
        },
    }
}

/// Response payload for the health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Service is healthy".to_string(),
        }
    }
}
