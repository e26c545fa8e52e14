use azurerm_core::resource_id;

resource_id! {
    /// A Media Services account
    pub struct MediaServicesAccountId {
        provider: "Microsoft.Media",
        segments: { name: "mediaServices" }
    }
}

resource_id! {
    /// A transform within a Media Services account
    pub struct TransformId {
        provider: "Microsoft.Media",
        segments: {
            account_name: "mediaServices",
            name: "transforms",
        }
    }
}

resource_id! {
    /// A streaming policy within a Media Services account
    pub struct StreamingPolicyId {
        provider: "Microsoft.Media",
        segments: {
            account_name: "mediaServices",
            name: "streamingPolicies",
        }
    }
}

resource_id! {
    /// A content key policy within a Media Services account
    pub struct ContentKeyPolicyId {
        provider: "Microsoft.Media",
        segments: {
            account_name: "mediaServices",
            name: "contentKeyPolicies",
        }
    }
}
