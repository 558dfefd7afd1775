use std::io::Write;

use actix_web::{HttpResponse, get, http::header::ContentType, web};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::handlers::{ApiError, lookup};
use crate::store::chunk_at;

#[derive(Deserialize)]
pub struct ChunkQuery {
    pub chunk_index: usize,
    pub chunk_size: Option<usize>,
    /// 是否以 gzip 压缩返回
    #[serde(default)]
    pub gzip: bool,
}

/// 以小端 Float64 二进制返回一段连续数据
#[get("/cubes/{cube_id}/chunk")]
pub async fn get_cube_chunk(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ChunkQuery>,
) -> Result<HttpResponse, ApiError> {
    let cube_id = path.into_inner();
    let entry = lookup(&data, &cube_id)?;
    let chunk_size = query.chunk_size.unwrap_or(data.config.default_chunk_size);

    // 只在拷贝数据时持有读锁
    let (descriptor, bytes) = {
        let cube = entry.cube.read();
        let Some(descriptor) = chunk_at(cube.len(), chunk_size, query.chunk_index) else {
            return Err(ApiError::ChunkNotFound(query.chunk_index));
        };
        let bytes = encode_values(&cube.data()[descriptor.start..descriptor.end])?;
        (descriptor, bytes)
    };

    let mut response = HttpResponse::Ok();
    response
        .content_type(ContentType::octet_stream())
        .append_header(("X-Chunk-Index", descriptor.index.to_string()))
        .append_header(("X-Chunk-Start", descriptor.start.to_string()))
        .append_header(("X-Chunk-End", descriptor.end.to_string()))
        .append_header((
            "X-Chunk-Length",
            (descriptor.end - descriptor.start).to_string(),
        ))
        .append_header(("X-Chunk-Cube", cube_id));

    if query.gzip {
        let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::fast());
        encoder.write_all(&bytes)?;
        let compressed = encoder.finish()?;
        return Ok(response
            .append_header(("Content-Encoding", "gzip"))
            .body(compressed));
    }
    Ok(response.body(bytes))
}

fn encode_values(values: &[f64]) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(std::mem::size_of_val(values));
    for &value in values {
        bytes.write_f64::<LittleEndian>(value)?;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use byteorder::ReadBytesExt;

    use super::*;

    #[test]
    fn values_are_little_endian_f64() {
        let bytes = encode_values(&[1.5, -2.0]).unwrap();
        assert_eq!(bytes.len(), 16);
        let mut reader = &bytes[..];
        assert_eq!(reader.read_f64::<LittleEndian>().unwrap(), 1.5);
        assert_eq!(reader.read_f64::<LittleEndian>().unwrap(), -2.0);
    }
}
