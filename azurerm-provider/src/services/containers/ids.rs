use azurerm_core::resource_id;

resource_id! {
    /// An AKS managed cluster
    pub struct ManagedClusterId {
        provider: "Microsoft.ContainerService",
        segments: { name: "managedClusters" }
    }
}

resource_id! {
    /// A node pool of an AKS managed cluster
    pub struct NodePoolId {
        provider: "Microsoft.ContainerService",
        segments: {
            cluster_name: "managedClusters",
            name: "agentPools",
        }
    }
}

resource_id! {
    pub struct ContainerRegistryId {
        provider: "Microsoft.ContainerRegistry",
        segments: { name: "registries" }
    }
}

resource_id! {
    pub struct ContainerGroupId {
        provider: "Microsoft.ContainerInstance",
        segments: { name: "containerGroups" }
    }
}
