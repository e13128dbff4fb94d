use std::path::Path;

use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};

use model::{RegionConfig, Rendezvous, TrajectorySegment, TIMESTAMP_FORMAT};

pub fn write_geojson(path: &Path, rendezvous: &Rendezvous, region: &RegionConfig) -> Result<()> {
    let gj = to_geojson(rendezvous, region);
    fs_err::write(path, serde_json::to_string_pretty(&gj)?)?;
    Ok(())
}

/// One marker per report, plus a line through each trajectory. The two vessels get different
/// colors.
pub fn to_geojson(rendezvous: &Rendezvous, region: &RegionConfig) -> GeoJson {
    // Blue and red
    let colors = [colorous::CATEGORY10[0], colorous::CATEGORY10[3]];

    let mut features = Vec::new();
    for (segment, color) in [&rendezvous.trajectory_a, &rendezvous.trajectory_b]
        .into_iter()
        .zip(colors)
    {
        features.extend(trajectory_features(segment, &hex(color)));
    }

    let mut props = JsonObject::new();
    props.insert("kind".to_string(), "region_center".into());
    props.insert("radius_km".to_string(), region.radius_km.into());
    features.push(feature(
        Value::Point(vec![region.center.lon, region.center.lat]),
        props,
    ));

    GeoJson::FeatureCollection(FeatureCollection {
        features,
        bbox: None,
        foreign_members: None,
    })
}

fn trajectory_features(segment: &TrajectorySegment, color: &str) -> Vec<Feature> {
    let mut features = Vec::new();
    for rec in segment.records() {
        let mut props = JsonObject::new();
        props.insert("kind".to_string(), "report".into());
        props.insert("vessel".to_string(), rec.vessel.0.clone().into());
        if let Some(ref name) = rec.name {
            props.insert("name".to_string(), name.clone().into());
        }
        props.insert(
            "timestamp".to_string(),
            rec.timestamp.format(TIMESTAMP_FORMAT).to_string().into(),
        );
        props.insert("marker-color".to_string(), color.into());
        features.push(feature(Value::Point(vec![rec.pos.lon, rec.pos.lat]), props));
    }

    // A LineString needs at least two points
    if segment.len() >= 2 {
        let mut props = JsonObject::new();
        props.insert("kind".to_string(), "trajectory".into());
        props.insert("vessel".to_string(), segment.vessel.0.clone().into());
        props.insert("stroke".to_string(), color.into());
        let line = segment
            .points()
            .into_iter()
            .map(|(_, pos)| vec![pos.lon, pos.lat])
            .collect();
        features.push(feature(Value::LineString(line), props));
    }
    features
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn hex(color: colorous::Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use ais::{RawBatch, RawRow};
    use model::{Aggregator, RunConfig};

    use super::*;

    fn row(timestamp: &str, mmsi: &str, lat: f64, name: Option<&str>) -> RawRow {
        RawRow {
            timestamp: timestamp.to_string(),
            mmsi: mmsi.to_string(),
            latitude: lat.to_string(),
            longitude: "14.245".to_string(),
            name: name.map(|x| x.to_string()),
        }
    }

    fn rendezvous() -> Rendezvous {
        let batch = RawBatch::new(
            "day",
            vec![
                row("01/12/2021 12:00:00", "1", 55.20, Some("ALICE")),
                row("01/12/2021 12:00:00", "2", 55.21, None),
                row("01/12/2021 12:01:00", "1", 55.19, Some("ALICE")),
            ],
        );
        Aggregator::new(RunConfig::default())
            .unwrap()
            .run(vec![Ok(batch)])
            .rendezvous
            .unwrap()
    }

    #[test]
    fn test_features() {
        let gj = to_geojson(&rendezvous(), &RegionConfig::default());
        let collection = match gj {
            GeoJson::FeatureCollection(fc) => fc,
            _ => panic!("expected a FeatureCollection"),
        };
        // Vessel 1: two markers and a line. Vessel 2: one marker. Then the center.
        assert_eq!(collection.features.len(), 5);

        let color_of = |vessel: &str| -> String {
            collection
                .features
                .iter()
                .filter_map(|f| f.properties.as_ref())
                .find(|p| p.get("vessel").and_then(|v| v.as_str()) == Some(vessel))
                .and_then(|p| p.get("marker-color"))
                .and_then(|c| c.as_str())
                .unwrap()
                .to_string()
        };
        assert_eq!(color_of("1"), "#1f77b4");
        assert_eq!(color_of("2"), "#d62728");

        let first = &collection.features[0];
        assert_eq!(
            first.properties.as_ref().unwrap()["timestamp"],
            "01/12/2021 12:00:00"
        );
        assert_eq!(first.properties.as_ref().unwrap()["name"], "ALICE");
        match first.geometry.as_ref().unwrap().value {
            Value::Point(ref pt) => assert_eq!(pt, &vec![14.245, 55.20]),
            _ => panic!("expected a point"),
        }
    }
}
