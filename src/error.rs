use thiserror::Error;

/// Failures at the input and output boundaries. Allocation itself never fails.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV malformado: {0}")]
    Csv(#[from] csv::Error),
    #[error("falha ao gerar a planilha: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("formulário sem coluna para {0}")]
    MissingColumn(&'static str),
    #[error("formulário sem coluna de nome")]
    MissingNameColumn,
}

pub type Result<T> = std::result::Result<T, RosterError>;
