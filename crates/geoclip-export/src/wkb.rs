//! Well-Known Binary encoding (little endian, 2D).
//!
//! Used for Parquet geometry columns and GeoPackage geometry blobs. Rect,
//! Triangle, and Line geometries have no WKB type of their own and are
//! written as the equivalent Polygon or LineString.

use geo::{Coord, Geometry, LineString, Polygon};

const WKB_POINT: u32 = 1;
const WKB_LINESTRING: u32 = 2;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOINT: u32 = 4;
const WKB_MULTILINESTRING: u32 = 5;
const WKB_MULTIPOLYGON: u32 = 6;
const WKB_GEOMETRYCOLLECTION: u32 = 7;

pub fn encode(geometry: &Geometry<f64>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    write_geometry(&mut buf, geometry);
    buf
}

fn write_geometry(buf: &mut Vec<u8>, geometry: &Geometry<f64>) {
    match geometry {
        Geometry::Point(p) => {
            write_header(buf, WKB_POINT);
            write_coord(buf, p.0);
        }
        Geometry::Line(l) => {
            write_header(buf, WKB_LINESTRING);
            write_u32(buf, 2);
            write_coord(buf, l.start);
            write_coord(buf, l.end);
        }
        Geometry::LineString(ls) => {
            write_header(buf, WKB_LINESTRING);
            write_ring(buf, ls);
        }
        Geometry::Polygon(p) => write_polygon(buf, p),
        Geometry::Rect(r) => write_polygon(buf, &r.to_polygon()),
        Geometry::Triangle(t) => write_polygon(buf, &t.to_polygon()),
        Geometry::MultiPoint(mp) => {
            write_header(buf, WKB_MULTIPOINT);
            write_u32(buf, mp.0.len() as u32);
            for point in &mp.0 {
                write_header(buf, WKB_POINT);
                write_coord(buf, point.0);
            }
        }
        Geometry::MultiLineString(mls) => {
            write_header(buf, WKB_MULTILINESTRING);
            write_u32(buf, mls.0.len() as u32);
            for ls in &mls.0 {
                write_header(buf, WKB_LINESTRING);
                write_ring(buf, ls);
            }
        }
        Geometry::MultiPolygon(mp) => {
            write_header(buf, WKB_MULTIPOLYGON);
            write_u32(buf, mp.0.len() as u32);
            for polygon in &mp.0 {
                write_polygon(buf, polygon);
            }
        }
        Geometry::GeometryCollection(gc) => {
            write_header(buf, WKB_GEOMETRYCOLLECTION);
            write_u32(buf, gc.0.len() as u32);
            for inner in &gc.0 {
                write_geometry(buf, inner);
            }
        }
    }
}

fn write_polygon(buf: &mut Vec<u8>, polygon: &Polygon<f64>) {
    write_header(buf, WKB_POLYGON);
    write_u32(buf, 1 + polygon.interiors().len() as u32);
    write_ring(buf, polygon.exterior());
    for interior in polygon.interiors() {
        write_ring(buf, interior);
    }
}

fn write_ring(buf: &mut Vec<u8>, ring: &LineString<f64>) {
    write_u32(buf, ring.0.len() as u32);
    for coord in &ring.0 {
        write_coord(buf, *coord);
    }
}

fn write_header(buf: &mut Vec<u8>, geometry_type: u32) {
    buf.push(0x01); // little endian
    write_u32(buf, geometry_type);
}

fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_coord(buf: &mut Vec<u8>, coord: Coord<f64>) {
    buf.extend_from_slice(&coord.x.to_le_bytes());
    buf.extend_from_slice(&coord.y.to_le_bytes());
}
