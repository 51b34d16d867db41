use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid must be non-empty (got {columns}x{rows})")]
    Empty { columns: u32, rows: u32 },

    #[error("cell sizes must be > 0 (got {column_width}x{row_height})")]
    CellSize { column_width: f32, row_height: f32 },
}
