//! Default metric-name tables per namespace
//!
//! Used when a metrics run does not name metrics explicitly. Static
//! configuration data; the lists mirror the provider's published metrics
//! for each namespace.

/// Default metric names for `namespace`, if the namespace is known.
pub fn default_metric_names(namespace: &str) -> Option<&'static [&'static str]> {
    let names: &'static [&'static str] = match namespace {
        "AWS/AutoScaling" => &[
            "GroupDesiredCapacity",
            "GroupInServiceInstances",
            "GroupMaxSize",
            "GroupMinSize",
            "GroupPendingInstances",
            "GroupStandbyInstances",
            "GroupTerminatingInstances",
            "GroupTotalInstances",
        ],
        "AWS/Billing" => &["EstimatedCharges"],
        "AWS/CloudFront" => &[
            "4xxErrorRate",
            "5xxErrorRate",
            "BytesDownloaded",
            "BytesUploaded",
            "Requests",
            "TotalErrorRate",
        ],
        "AWS/DynamoDB" => &[
            "ConditionalCheckFailedRequests",
            "ConsumedReadCapacityUnits",
            "ConsumedWriteCapacityUnits",
            "ProvisionedReadCapacityUnits",
            "ProvisionedWriteCapacityUnits",
            "ReadThrottleEvents",
            "ReturnedBytes",
            "ReturnedItemCount",
            "SuccessfulRequestLatency",
            "SystemErrors",
            "ThrottledRequests",
            "UserErrors",
            "WriteThrottleEvents",
        ],
        "AWS/EBS" => &[
            "BurstBalance",
            "VolumeConsumedReadWriteOps",
            "VolumeIdleTime",
            "VolumeQueueLength",
            "VolumeReadBytes",
            "VolumeReadOps",
            "VolumeThroughputPercentage",
            "VolumeTotalReadTime",
            "VolumeTotalWriteTime",
            "VolumeWriteBytes",
            "VolumeWriteOps",
        ],
        "AWS/EC2" => &[
            "CPUCreditBalance",
            "CPUCreditUsage",
            "CPUUtilization",
            "DiskReadBytes",
            "DiskReadOps",
            "DiskWriteBytes",
            "DiskWriteOps",
            "NetworkIn",
            "NetworkOut",
            "NetworkPacketsIn",
            "NetworkPacketsOut",
            "StatusCheckFailed",
            "StatusCheckFailed_Instance",
            "StatusCheckFailed_System",
        ],
        "AWS/ECS" => &[
            "CPUReservation",
            "CPUUtilization",
            "MemoryReservation",
            "MemoryUtilization",
        ],
        "AWS/ELB" => &[
            "BackendConnectionErrors",
            "HTTPCode_Backend_2XX",
            "HTTPCode_Backend_3XX",
            "HTTPCode_Backend_4XX",
            "HTTPCode_Backend_5XX",
            "HTTPCode_ELB_4XX",
            "HTTPCode_ELB_5XX",
            "HealthyHostCount",
            "Latency",
            "RequestCount",
            "SpilloverCount",
            "SurgeQueueLength",
            "UnHealthyHostCount",
        ],
        "AWS/ElastiCache" => &[
            "BytesUsedForCache",
            "CacheHits",
            "CacheMisses",
            "CPUUtilization",
            "CurrConnections",
            "Evictions",
            "NetworkBytesIn",
            "NetworkBytesOut",
        ],
        "AWS/Kinesis" => &[
            "GetRecords.Bytes",
            "GetRecords.IteratorAge",
            "GetRecords.IteratorAgeMilliseconds",
            "GetRecords.Latency",
            "GetRecords.Success",
            "IncomingBytes",
            "IncomingRecords",
            "PutRecord.Bytes",
            "PutRecord.Latency",
            "PutRecord.Success",
            "PutRecords.Bytes",
            "PutRecords.Latency",
            "PutRecords.Records",
            "PutRecords.Success",
        ],
        "AWS/Lambda" => &["Duration", "Errors", "Invocations", "Throttles"],
        "AWS/RDS" => &[
            "BinLogDiskUsage",
            "CPUCreditBalance",
            "CPUCreditUsage",
            "CPUUtilization",
            "DatabaseConnections",
            "DiskQueueDepth",
            "FreeStorageSpace",
            "FreeableMemory",
            "NetworkReceiveThroughput",
            "NetworkTransmitThroughput",
            "ReadIOPS",
            "ReadLatency",
            "ReadThroughput",
            "ReplicaLag",
            "SwapUsage",
            "WriteIOPS",
            "WriteLatency",
            "WriteThroughput",
        ],
        "AWS/S3" => &["BucketSizeBytes", "NumberOfObjects"],
        "AWS/SNS" => &[
            "NumberOfMessagesPublished",
            "NumberOfNotificationsDelivered",
            "NumberOfNotificationsFailed",
            "PublishSize",
        ],
        "AWS/SQS" => &[
            "ApproximateNumberOfMessagesDelayed",
            "ApproximateNumberOfMessagesNotVisible",
            "ApproximateNumberOfMessagesVisible",
            "NumberOfEmptyReceives",
            "NumberOfMessagesDeleted",
            "NumberOfMessagesReceived",
            "NumberOfMessagesSent",
            "SentMessageSize",
        ],
        _ => return None,
    };
    Some(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_namespace() {
        let names = default_metric_names("AWS/EC2").unwrap();
        assert!(names.contains(&"CPUUtilization"));
    }

    #[test]
    fn test_unknown_namespace() {
        assert!(default_metric_names("Custom/App").is_none());
    }
}
