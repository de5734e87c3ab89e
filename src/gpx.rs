//! GPX 1.1 export.
//!
//! Each waypoint becomes a `<wpt>` element. The same points are also written
//! as a single-segment track so mapping tools draw the route line.

use std::io::Write;

use chrono::SecondsFormat;
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::Waypoint;

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
const GPX_CREATOR: &str = "photo-route";

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Write one point element (`wpt` or `trkpt`) with its optional children.
fn write_point<W: Write>(writer: &mut Writer<W>, tag: &str, wp: &Waypoint, with_name: bool) -> Result<()> {
    let lat = format!("{:.7}", wp.latitude);
    let lon = format!("{:.7}", wp.longitude);

    let mut start = BytesStart::new(tag);
    start.push_attribute(("lat", lat.as_str()));
    start.push_attribute(("lon", lon.as_str()));
    writer.write_event(Event::Start(start))?;

    if let Some(alt) = wp.altitude {
        write_text_element(writer, "ele", &format!("{:.1}", alt))?;
    }
    if let Some(ts) = wp.timestamp {
        write_text_element(writer, "time", &ts.to_rfc3339_opts(SecondsFormat::Secs, true))?;
    }
    if with_name {
        write_text_element(writer, "name", &wp.name)?;
    }

    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Write `waypoints` as a GPX 1.1 document.
///
/// Waypoints are written in the order given; pass normalized waypoints to get
/// a time-ordered track.
pub fn write_gpx<W: Write>(waypoints: &[Waypoint], out: W) -> Result<()> {
    let mut writer = Writer::new_with_indent(out, b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut gpx = BytesStart::new("gpx");
    gpx.push_attribute(("version", "1.1"));
    gpx.push_attribute(("creator", GPX_CREATOR));
    gpx.push_attribute(("xmlns", GPX_NAMESPACE));
    writer.write_event(Event::Start(gpx))?;

    for wp in waypoints {
        write_point(&mut writer, "wpt", wp, true)?;
    }

    if !waypoints.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("trk")))?;
        write_text_element(&mut writer, "name", "Photo route")?;
        writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for wp in waypoints {
            write_point(&mut writer, "trkpt", wp, false)?;
        }
        writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
        writer.write_event(Event::End(BytesEnd::new("trk")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    debug!("[Gpx] wrote {} waypoints", waypoints.len());
    Ok(())
}

/// Render `waypoints` as a GPX 1.1 document string.
///
/// ```rust
/// use photo_route::{to_gpx_string, Waypoint};
///
/// let gpx = to_gpx_string(&[Waypoint::new("IMG_0001.jpg", 46.5, 6.6).with_altitude(372.0)]).unwrap();
/// assert!(gpx.contains(r#"<wpt lat="46.5000000" lon="6.6000000">"#));
/// assert!(gpx.contains("<ele>372.0</ele>"));
/// ```
pub fn to_gpx_string(waypoints: &[Waypoint]) -> Result<String> {
    let mut buffer = Vec::new();
    write_gpx(waypoints, &mut buffer)?;
    // Everything written above is UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_gpx_document() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let waypoints = vec![
            Waypoint::new("a.jpg", 46.5, 6.6).with_altitude(372.0).with_timestamp(t0),
            Waypoint::new("b.jpg", 46.51, 6.61),
        ];
        let gpx = to_gpx_string(&waypoints).unwrap();

        assert!(gpx.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(gpx.contains(r#"creator="photo-route""#));
        assert!(gpx.contains("<time>2024-05-01T10:00:00Z</time>"));
        assert!(gpx.contains("<name>a.jpg</name>"));
        assert_eq!(gpx.matches("<wpt ").count(), 2);
        assert_eq!(gpx.matches("<trkpt ").count(), 2);
        assert_eq!(gpx.matches("<ele>").count(), 2);
        assert!(gpx.trim_end().ends_with("</gpx>"));
    }

    #[test]
    fn test_names_are_escaped() {
        let gpx = to_gpx_string(&[Waypoint::new("a&b <1>.jpg", 0.0, 0.0)]).unwrap();
        assert!(gpx.contains("<name>a&amp;b &lt;1&gt;.jpg</name>"));
    }

    #[test]
    fn test_empty_has_no_track() {
        let gpx = to_gpx_string(&[]).unwrap();
        assert!(gpx.contains("<gpx "));
        assert!(!gpx.contains("<trk>"));
    }
}
