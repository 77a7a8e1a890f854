pub mod category;
pub mod qrcode;
pub mod scan;
pub mod short_url;

pub use category::{Category, CreateCategoryRequest, DEFAULT_CATEGORY_COLOR};
pub use qrcode::{
    retarget_content, CategoryAssignRequest, ListQrQuery, NewQrCode, QrCodePage, QrCodeRecord,
    QrStatus, RenameRequest, RenderRequest, RetargetRequest, SaveQrRequest, SaveQrResponse,
    ShortCodeRequest, StatusRequest,
};
pub use scan::{DeviceClass, NewScan, ScanEvent, ScanTarget, Utm};
pub use short_url::{NewShortUrl, ShortCodeResponse, ShortUrlRecord};
