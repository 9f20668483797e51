//! Built-in dataset column lists and the standard daily plan.
use crate::config::*;
use crate::error::*;

/// Weather forecasts from Visual Crossing (table `forecast`).
#[rustfmt::skip]
pub const VISUALCROSSING: &[&str] = &[
    "gtp", "datetime", "tzoffset", "datetime_msc", "loadtime",
    "sunrise", "sunset", "temp", "dew", "humidity",
    "precip", "precipprob", "preciptype", "snow", "snowdepth",
    "windgust", "windspeed", "pressure", "cloudcover", "visibility",
    "solarradiation", "solarenergy", "uvindex", "severerisk", "conditions",
];

/// Weather forecasts from Open-Meteo.
#[rustfmt::skip]
pub const OPENMETEO: &[&str] = &[
    "gtp", "datetime_msc", "loadtime",
    "temperature_2m", "relativehumidity_2m", "dewpoint_2m", "apparent_temperature",
    "pressure_msl", "surface_pressure",
    "cloudcover", "cloudcover_low", "cloudcover_mid", "cloudcover_high",
    "windspeed_10m", "windspeed_80m", "windspeed_120m", "windspeed_180m",
    "winddirection_10m", "winddirection_80m", "winddirection_120m", "winddirection_180m",
    "windgusts_10m",
    "shortwave_radiation", "direct_radiation", "direct_normal_irradiance", "diffuse_radiation",
    "vapor_pressure_deficit", "evapotranspiration", "et0_fao_evapotranspiration",
    "precipitation", "snowfall", "rain", "showers", "weathercode",
    "snow_depth", "freezinglevel_height",
    "soil_temperature_0cm", "soil_temperature_6cm", "soil_temperature_18cm", "soil_temperature_54cm",
    "soil_moisture_0_1cm", "soil_moisture_1_3cm", "soil_moisture_3_9cm",
    "soil_moisture_9_27cm", "soil_moisture_27_81cm",
];

/// Weather forecasts from Tomorrow.io.
#[rustfmt::skip]
pub const TOMORROW_IO: &[&str] = &[
    "gtp", "datetime_msc", "loadtime",
    "temperature", "temperatureApparent", "dewPoint", "humidity",
    "windSpeed", "windDirection", "windGust", "pressureSurfaceLevel",
    "precipitationIntensity", "rainIntensity", "freezingRainIntensity",
    "snowIntensity", "sleetIntensity", "precipitationProbability", "precipitationType",
    "rainAccumulation", "snowAccumulation", "snowAccumulationLwe",
    "sleetAccumulation", "sleetAccumulationLwe", "iceAccumulation", "iceAccumulationLwe",
    "visibility", "cloudCover", "cloudBase", "cloudCeiling",
    "uvIndex", "evapotranspiration", "weatherCode",
];

/// Balancing-market plans per generating unit.
#[rustfmt::skip]
pub const PBR_BR: &[&str] = &[
    "GTP_ID", "GTP_NAME", "dt",
    "SESSION_DATE", "SESSION_NUMBER", "SESSION_INTERVAL",
    "TG", "PminPDG", "PmaxPDG",
    "PVsvgo", "PminVsvgo", "PmaxVsvgo",
    "PminBR", "PmaxBR", "IBR",
    "CbUP", "CbDown", "CRSV", "TotalBR",
    "EVR", "OCPU", "OCPS", "Pmin", "Pmax",
];

/// Days of `pbr_br` history kept on the dashboard replica.
pub const PBR_BR_RETENTION_DAYS: u64 = 7;

/// Column list for a built-in dataset name.
pub fn columns(dataset: &str) -> Result<&'static [&'static str]> {
    match dataset {
        "visualcrossing" | "forecast" => Ok(VISUALCROSSING),
        "openmeteo" => Ok(OPENMETEO),
        "tomorrow_io" => Ok(TOMORROW_IO),
        "pbr_br" => Ok(PBR_BR),
        other => Err(ReplicationError::configuration(format!(
            "unknown dataset {}",
            other
        ))),
    }
}

/// The daily plan used when the settings file has no `jobs` section.
///
/// Connection indices: 0/1 weather source/replica, 2/3 `pbr_br`
/// source/replica, 4/5 `pbr_br` source/dashboard replica.
pub fn standard() -> Vec<JobEntry> {
    let job = |name: &str, dataset: &str, window: &str, source, destination| JobEntry {
        name: name.to_string(),
        table: if dataset == "visualcrossing" { "forecast" } else { dataset }.to_string(),
        target: None,
        dataset: Some(dataset.to_string()),
        columns: None,
        window_column: window.to_string(),
        source,
        destination,
        retention: None,
    };
    vec![
        job("forecast", "visualcrossing", "loadtime", 0, 1),
        job("openmeteo", "openmeteo", "loadtime", 0, 1),
        job("tomorrow_io", "tomorrow_io", "loadtime", 0, 1),
        job("pbr_br", "pbr_br", "dt", 2, 3),
        JobEntry {
            retention: Some(RetentionEntry {
                table: None,
                column: String::from("dt"),
                days: PBR_BR_RETENTION_DAYS,
            }),
            ..job("pbr_br_grafana", "pbr_br", "dt", 4, 5)
        },
    ]
}
