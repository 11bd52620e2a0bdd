use crate::error::Result;
use crate::geom::{Bounds, gpkg_geometry_to_wkb, header_envelope};
use geo_traits::{
    CoordTrait, GeometryCollectionTrait, GeometryTrait, LineStringTrait, MultiLineStringTrait,
    MultiPointTrait, MultiPolygonTrait, PointTrait, PolygonTrait,
};
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{Connection, Error};

/// Register the extent SQL functions (`ST_MinX`, `ST_MaxX`, `ST_MinY`,
/// `ST_MaxY`) on the provided connection.
///
/// Each takes a GeoPackage geometry blob and returns the requested bound, or
/// NULL for NULL/empty geometries. Blobs that carry a header envelope are
/// answered without parsing the WKB payload.
pub fn register_envelope_functions(conn: &Connection) -> Result<()> {
    register_extent(conn, "ST_MinX", |b| b.minx)?;
    register_extent(conn, "ST_MaxX", |b| b.maxx)?;
    register_extent(conn, "ST_MinY", |b| b.miny)?;
    register_extent(conn, "ST_MaxY", |b| b.maxy)?;
    Ok(())
}

fn register_extent<F>(conn: &Connection, name: &str, component: F) -> Result<()>
where
    F: Fn(Bounds) -> f64 + Copy + Send + Sync + 'static,
{
    conn.create_scalar_function(name, 1, FunctionFlags::SQLITE_DETERMINISTIC, move |ctx| {
        Ok(geometry_bounds(ctx)?.map(component))
    })?;
    Ok(())
}

fn geometry_bounds(ctx: &Context<'_>) -> std::result::Result<Option<Bounds>, Error> {
    let blob = match ctx.get_raw(0) {
        ValueRef::Null => return Ok(None),
        ValueRef::Blob(blob) => blob,
        _ => return Err(Error::InvalidFunctionParameterType(0, Type::Blob)),
    };

    if let Some(bounds) = header_envelope(blob).map_err(user_error)? {
        return Ok(Some(bounds));
    }

    let wkb = gpkg_geometry_to_wkb(blob).map_err(user_error)?;
    Ok(wkb_bounds(&wkb))
}

fn user_error(err: crate::error::OptimizerError) -> Error {
    Error::UserFunctionError(Box::new(err))
}

fn wkb_bounds<G: GeometryTrait<T = f64>>(geom: &G) -> Option<Bounds> {
    use geo_traits::GeometryType as GeoType;

    let mut bounds: Option<Bounds> = None;
    match geom.as_type() {
        GeoType::Point(point) => {
            if let Some(coord) = point.coord() {
                extend(&mut bounds, coord.x_y());
            }
        }
        GeoType::LineString(line) => {
            for coord in line.coords() {
                extend(&mut bounds, coord.x_y());
            }
        }
        GeoType::Polygon(polygon) => {
            for ring in polygon.exterior().into_iter().chain(polygon.interiors()) {
                for coord in ring.coords() {
                    extend(&mut bounds, coord.x_y());
                }
            }
        }
        GeoType::MultiPoint(multi) => {
            for point in multi.points() {
                if let Some(coord) = point.coord() {
                    extend(&mut bounds, coord.x_y());
                }
            }
        }
        GeoType::MultiLineString(multi) => {
            for line in multi.line_strings() {
                for coord in line.coords() {
                    extend(&mut bounds, coord.x_y());
                }
            }
        }
        GeoType::MultiPolygon(multi) => {
            for polygon in multi.polygons() {
                for ring in polygon.exterior().into_iter().chain(polygon.interiors()) {
                    for coord in ring.coords() {
                        extend(&mut bounds, coord.x_y());
                    }
                }
            }
        }
        GeoType::GeometryCollection(collection) => {
            for geometry in collection.geometries() {
                if let Some(other) = wkb_bounds(&geometry) {
                    extend(&mut bounds, (other.minx, other.miny));
                    extend(&mut bounds, (other.maxx, other.maxy));
                }
            }
        }
        // Not representable in GeoPackage geometry blobs.
        GeoType::Rect(_) | GeoType::Triangle(_) | GeoType::Line(_) => {}
    }

    bounds
}

fn extend(bounds: &mut Option<Bounds>, (x, y): (f64, f64)) {
    match bounds {
        Some(b) => {
            b.minx = b.minx.min(x);
            b.maxx = b.maxx.max(x);
            b.miny = b.miny.min(y);
            b.maxy = b.maxy.max(y);
        }
        None => {
            *bounds = Some(Bounds {
                minx: x,
                maxx: x,
                miny: y,
                maxy: y,
            });
        }
    }
}
