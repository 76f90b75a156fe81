use collection_planner::model::Coordinate;

/// Parses `lat,lng` into a validated coordinate.
pub fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected 'lat,lng', got '{}'", s))?;
    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{}': {}", lat, e))?;
    let lng = lng
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{}': {}", lng, e))?;

    let coordinate = Coordinate::new(lat, lng);
    coordinate.validate().map_err(|e| e.to_string())?;
    Ok(coordinate)
}
