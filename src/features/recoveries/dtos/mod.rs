mod recovery_dto;

pub use recovery_dto::{
    CreateRecoveryReportDto, RecoveryListQuery, RecoveryReportResponseDto,
    UpdateRecoveryReportDto,
};
