use crate::profile::Theme;

/// Resolve a declared layer type to a theme.
///
/// Exact and synonym matches are case-sensitive, mirroring what the data
/// service emits. Anything else, including an absent tag, degrades to the
/// neutral default theme; classification can never fail.
pub fn classify(layer_type: Option<&str>) -> Theme {
    match layer_type.unwrap_or("") {
        "weather" | "temperature" => Theme::Weather,
        "country" | "countries" => Theme::Country,
        "earthquakes" | "earthquake" | "seismic" => Theme::Earthquake,
        "density" | "population" => Theme::Density,
        "roads" | "highways" | "streets" => Theme::Roads,
        "parks" | "forests" | "vegetation" => Theme::Vegetation,
        "water" | "rivers" | "hydrology" => Theme::Hydrology,
        "buildings" | "poi" | "amenities" => Theme::PointOfInterest,
        _ => Theme::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::classify;
    use crate::profile::Theme;

    #[test]
    fn synonyms_select_the_same_theme() {
        assert_eq!(classify(Some("weather")), Theme::Weather);
        assert_eq!(classify(Some("temperature")), Theme::Weather);
        assert_eq!(classify(Some("population")), Theme::Density);
        assert_eq!(classify(Some("density")), Theme::Density);
        assert_eq!(classify(Some("earthquakes")), Theme::Earthquake);
        assert_eq!(classify(Some("rivers")), Theme::Hydrology);
        assert_eq!(classify(Some("forests")), Theme::Vegetation);
    }

    #[test]
    fn unknown_or_absent_types_degrade_to_default() {
        assert_eq!(classify(None), Theme::Default);
        assert_eq!(classify(Some("")), Theme::Default);
        assert_eq!(classify(Some("volcanoes")), Theme::Default);
        // Case-sensitive: a differently-cased tag is an unknown tag.
        assert_eq!(classify(Some("Weather")), Theme::Default);
    }
}
