//! Full update-cycle behavior across all five adapters.

use foundation::LonLat;
use geodata::FeatureCollection;
use session::{QueryUpdate, Session, standard_adapters};
use thematic::Theme;
use viewport::FALLBACK_ALTITUDE_M;

const QUAKES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [142.3, 38.1] },
            "properties": { "magnitude": 6.5, "location": "off the coast of Honshu" }
        },
        {
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [140.8, 36.4] },
            "properties": { "mag": 4.2 }
        }
    ],
    "metadata": { "layer_type": "earthquakes", "feature_count": 2, "source": "USGS" }
}"#;

const WEATHER_GRID: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[37.0, 55.0], [38.0, 55.0], [38.0, 56.0], [37.0, 56.0], [37.0, 55.0]]]
            },
            "properties": { "temperature": -15.0 }
        },
        {
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[38.0, 55.0], [39.0, 55.0], [39.0, 56.0], [38.0, 56.0], [38.0, 55.0]]]
            },
            "properties": { "temperature": 25.0 }
        }
    ],
    "metadata": { "layer_type": "weather", "feature_count": 2, "source": "Open-Meteo" }
}"#;

const ONE_QUAKE: &str = r#"{
    "type": "FeatureCollection",
    "features": [{
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": [142.3, 38.1] },
        "properties": { "magnitude": 6.5 }
    }],
    "metadata": { "layer_type": "earthquakes", "feature_count": 1 }
}"#;

const EMPTY: &str = r#"{
    "type": "FeatureCollection",
    "features": [],
    "metadata": { "layer_type": "weather", "feature_count": 0 }
}"#;

fn collection(json: &str) -> FeatureCollection {
    FeatureCollection::from_json_str(json).expect("fixture parses")
}

#[test]
fn one_update_reaches_every_adapter() {
    let mut session = Session::new(standard_adapters());
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(QUAKES)),
            view_position: None,
        },
        0,
    );
    session.tick(16);

    assert_eq!(session.active_theme(), Theme::Earthquake);
    for (name, count) in session.primitive_counts() {
        assert!(count > 0, "{name} rendered nothing");
    }
}

#[test]
fn camera_frames_the_bounding_region_over_the_explicit_position() {
    let mut session = Session::new(standard_adapters());
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(WEATHER_GRID)),
            view_position: Some(LonLat::new(0.0, 0.0)),
        },
        0,
    );

    let target = session.last_target().expect("a target was framed");
    assert!((target.center.lon - 38.0).abs() < 1e-9);
    assert!((target.center.lat - 55.5).abs() < 1e-9);
    assert!(session.is_framing());

    // Transition elapses back to idle.
    session.tick(5_000);
    assert!(!session.is_framing());
}

#[test]
fn empty_collection_with_view_position_frames_the_explicit_coordinate() {
    let mut session = Session::new(standard_adapters());
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(EMPTY)),
            view_position: Some(LonLat::new(139.7, 35.7)),
        },
        0,
    );
    session.tick(16);

    let target = session.last_target().expect("explicit fallback target");
    assert_eq!(target.altitude_m, FALLBACK_ALTITUDE_M);
    assert!((target.center.lon - 139.7).abs() < 1e-12);

    for (_, count) in session.primitive_counts() {
        assert_eq!(count, 0);
    }
}

#[test]
fn second_update_preempts_an_unresolved_first_one() {
    let mut session = Session::new(standard_adapters());

    // Two updates land before any event-loop tick resolves the staged
    // engine loads; only the second may ever become visible.
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(WEATHER_GRID)),
            view_position: None,
        },
        0,
    );
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(ONE_QUAKE)),
            view_position: None,
        },
        100,
    );
    session.tick(200);

    assert_eq!(session.active_theme(), Theme::Earthquake);
    // The weather grid would have produced two primitives on every
    // surface; the lone quake produces exactly one.
    for (name, count) in session.primitive_counts() {
        assert_eq!(count, 1, "{name} should render only the second update");
    }
}

#[test]
fn clearing_an_update_cycle_empties_every_surface() {
    let mut session = Session::new(standard_adapters());
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(WEATHER_GRID)),
            view_position: None,
        },
        0,
    );
    session.tick(16);

    session.apply_update(QueryUpdate::default(), 32);
    session.tick(48);

    assert!(session.collection().is_none());
    for (name, count) in session.primitive_counts() {
        assert_eq!(count, 0, "{name} still holds primitives after clear");
    }
}

#[test]
fn teardown_is_idempotent_across_the_whole_session() {
    let mut session = Session::new(standard_adapters());
    session.apply_update(
        QueryUpdate {
            collection: Some(collection(QUAKES)),
            view_position: None,
        },
        0,
    );
    session.tick(16);

    session.teardown();
    session.teardown();
    for (_, count) in session.primitive_counts() {
        assert_eq!(count, 0);
    }
}
