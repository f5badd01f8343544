
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, Int64Array, RecordBatchIterator, StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use futures::TryStreamExt;
use lancedb::{
    Connection, DistanceType,
    query::{ExecutableQuery, QueryBase},
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{RagError, Result};

const TABLE_NAME: &str = "sections";

/// Section ready for bulk insertion: one chunk of a document's text
/// plus its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSection {
    pub document_id: i64,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Ephemeral similarity-search result. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub document_id: i64,
    pub content: String,
    pub similarity: f32,
}

/// Section vector table backed by LanceDB.
pub struct SectionIndex {
    connection: Connection,
    dimension: usize,
}

impl SectionIndex {
    /// Connect to (and if necessary create) the section vector table.
    /// Re-connecting to an existing table is safe.
    #[inline]
    pub async fn connect(db_path: &Path, dimension: usize) -> Result<Self> {
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                RagError::Config(format!("Failed to create vector database directory: {e}"))
            })?;
        }

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Config(format!("Failed to connect to LanceDB: {e}")))?;

        let index = Self {
            connection,
            dimension,
        };
        index.initialize_table().await?;

        info!("Section index initialized successfully");
        Ok(index)
    }

    async fn initialize_table(&self) -> Result<()> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Config(format!("Failed to list tables: {e}")))?;

        if table_names.contains(&TABLE_NAME.to_string()) {
            debug!("Sections table already exists");
            return Ok(());
        }

        info!(
            "Creating sections table with {} dimensions",
            self.dimension
        );

        self.connection
            .create_empty_table(TABLE_NAME, self.schema())
            .execute()
            .await
            .map_err(|e| RagError::Config(format!("Failed to create sections table: {e}")))?;

        Ok(())
    }

    /// Check that the sections table has been provisioned.
    #[inline]
    pub async fn is_provisioned(&self) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::StoreRead(format!("Failed to list tables: {e}")))?;

        Ok(table_names.contains(&TABLE_NAME.to_string()))
    }

    fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("document_id", DataType::Int64, false),
            Field::new("content", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    self.dimension as i32,
                ),
                false,
            ),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Bulk insert sections in a single call.
    ///
    /// On error the caller must assume sections may be missing; no
    /// partial-insert bookkeeping is attempted here.
    #[inline]
    pub async fn insert(&self, sections: &[NewSection]) -> Result<()> {
        if sections.is_empty() {
            debug!("No sections to insert");
            return Ok(());
        }

        for section in sections {
            if section.embedding.len() != self.dimension {
                return Err(RagError::StoreWrite(format!(
                    "Section embedding has {} dimensions, table expects {}",
                    section.embedding.len(),
                    self.dimension
                )));
            }
        }

        debug!("Inserting batch of {} sections", sections.len());

        let record_batch = self.create_record_batch(sections)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let table = self
            .open_table()
            .await
            .map_err(|e| RagError::StoreWrite(format!("Failed to open sections table: {e}")))?;
        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| RagError::StoreWrite(format!("Failed to insert sections: {e}")))?;

        info!("Stored {} sections", sections.len());
        Ok(())
    }

    fn create_record_batch(&self, sections: &[NewSection]) -> Result<RecordBatch> {
        let len = sections.len();
        let now = Utc::now().to_rfc3339();

        let ids: Vec<String> = (0..len).map(|_| Uuid::new_v4().to_string()).collect();
        let document_ids: Vec<i64> = sections.iter().map(|s| s.document_id).collect();
        let contents: Vec<&str> = sections.iter().map(|s| s.content.as_str()).collect();
        let created_ats: Vec<&str> = (0..len).map(|_| now.as_str()).collect();

        let mut flat_values = Vec::with_capacity(len * self.dimension);
        for section in sections {
            flat_values.extend_from_slice(&section.embedding);
        }
        let values_array = Float32Array::from(flat_values);
        let item_field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array = FixedSizeListArray::try_new(
            item_field,
            self.dimension as i32,
            Arc::new(values_array),
            None,
        )
        .map_err(|e| RagError::StoreWrite(format!("Failed to create vector array: {e}")))?;

        let arrays: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(Int64Array::from(document_ids)),
            Arc::new(StringArray::from(contents)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(self.schema(), arrays)
            .map_err(|e| RagError::StoreWrite(format!("Failed to create record batch: {e}")))
    }

    /// Cosine similarity search: at most `limit` matches with
    /// similarity >= `threshold`, descending.
    #[inline]
    pub async fn search(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<QueryMatch>> {
        if query_embedding.len() != self.dimension {
            return Err(RagError::StoreSearch(format!(
                "Query embedding has {} dimensions, table expects {}",
                query_embedding.len(),
                self.dimension
            )));
        }

        debug!(
            "Searching sections with threshold {} and limit {}",
            threshold, limit
        );

        let table = self
            .open_table()
            .await
            .map_err(|e| RagError::StoreSearch(format!("Failed to open sections table: {e}")))?;

        let mut results = table
            .vector_search(query_embedding)
            .map_err(|e| RagError::StoreSearch(format!("Failed to create vector search: {e}")))?
            .distance_type(DistanceType::Cosine)
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RagError::StoreSearch(format!("Failed to execute search: {e}")))?;

        let mut matches = Vec::new();
        while let Some(batch) = results
            .try_next()
            .await
            .map_err(|e| RagError::StoreSearch(format!("Failed to read result stream: {e}")))?
        {
            matches.extend(Self::parse_search_batch(&batch)?);
        }

        // LanceDB returns ascending distance, so matches are already in
        // descending similarity order.
        matches.retain(|m| m.similarity >= threshold);
        matches.truncate(limit);

        debug!("Search returned {} matches", matches.len());
        Ok(matches)
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<QueryMatch>> {
        let document_ids = batch
            .column_by_name("document_id")
            .and_then(|col| col.as_any().downcast_ref::<Int64Array>())
            .ok_or_else(|| {
                RagError::StoreSearch("Missing or invalid document_id column".to_string())
            })?;

        let contents = batch
            .column_by_name("content")
            .and_then(|col| col.as_any().downcast_ref::<StringArray>())
            .ok_or_else(|| RagError::StoreSearch("Missing or invalid content column".to_string()))?;

        let distances = batch
            .column_by_name("_distance")
            .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| {
                RagError::StoreSearch("Missing or invalid _distance column".to_string())
            })?;

        let mut matches = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let distance = if distances.is_null(row) {
                0.0
            } else {
                distances.value(row)
            };

            matches.push(QueryMatch {
                document_id: document_ids.value(row),
                content: contents.value(row).to_string(),
                // Cosine distance in [0, 2] maps to similarity in [-1, 1]
                similarity: 1.0 - distance,
            });
        }

        Ok(matches)
    }

    /// Delete every section belonging to a document (cascade).
    #[inline]
    pub async fn delete_for_document(&self, document_id: i64) -> Result<()> {
        debug!("Deleting sections for document {}", document_id);

        let table = self
            .open_table()
            .await
            .map_err(|e| RagError::StoreWrite(format!("Failed to open sections table: {e}")))?;
        table
            .delete(&format!("document_id = {document_id}"))
            .await
            .map_err(|e| {
                RagError::StoreWrite(format!(
                    "Failed to delete sections for document {document_id}: {e}"
                ))
            })?;

        info!("Deleted sections for document {}", document_id);
        Ok(())
    }

    #[inline]
    pub async fn count(&self) -> Result<u64> {
        let table = self
            .open_table()
            .await
            .map_err(|e| RagError::StoreRead(format!("Failed to open sections table: {e}")))?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RagError::StoreRead(format!("Failed to count sections: {e}")))?;

        Ok(count as u64)
    }

    #[inline]
    pub async fn count_for_document(&self, document_id: i64) -> Result<u64> {
        let table = self
            .open_table()
            .await
            .map_err(|e| RagError::StoreRead(format!("Failed to open sections table: {e}")))?;
        let count = table
            .count_rows(Some(format!("document_id = {document_id}")))
            .await
            .map_err(|e| {
                RagError::StoreRead(format!(
                    "Failed to count sections for document {document_id}: {e}"
                ))
            })?;

        Ok(count as u64)
    }

    async fn open_table(&self) -> std::result::Result<lancedb::Table, lancedb::Error> {
        self.connection.open_table(TABLE_NAME).execute().await
    }
}
